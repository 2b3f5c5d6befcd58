// Adapters layer: wire codecs and the HTTP transports built on them.

pub mod http;
pub mod jsonrpc;
pub mod xmlrpc;

use crate::domain::model::{MethodCall, Value};
use crate::domain::ports::{ConfigProvider, Transport, TransportKind};
use crate::utils::error::Result;
use async_trait::async_trait;

pub use jsonrpc::JsonRpcTransport;
pub use xmlrpc::XmlRpcTransport;

/// Transport picked at runtime from configuration.
#[derive(Debug)]
pub enum RpcTransport {
    Xml(XmlRpcTransport),
    Json(JsonRpcTransport),
}

impl RpcTransport {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = http::build_client(config.timeout())?;
        let endpoint = config.endpoint().to_string();
        tracing::debug!("Using {:?} transport at {}", config.transport(), endpoint);

        Ok(match config.transport() {
            TransportKind::Xmlrpc => RpcTransport::Xml(XmlRpcTransport::with_client(client, endpoint)),
            TransportKind::Jsonrpc => RpcTransport::Json(JsonRpcTransport::with_client(client, endpoint)),
        })
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            RpcTransport::Xml(_) => TransportKind::Xmlrpc,
            RpcTransport::Json(_) => TransportKind::Jsonrpc,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            RpcTransport::Xml(t) => t.endpoint(),
            RpcTransport::Json(t) => t.endpoint(),
        }
    }
}

#[async_trait]
impl Transport for RpcTransport {
    async fn call(&self, request: &MethodCall) -> Result<Value> {
        match self {
            RpcTransport::Xml(t) => t.call(request).await,
            RpcTransport::Json(t) => t.call(request).await,
        }
    }
}
