use crate::domain::model::{MethodCall, Value};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Sends one method call and waits for its reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &MethodCall) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TransportKind {
    #[default]
    Xmlrpc,
    Jsonrpc,
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn transport(&self) -> TransportKind;
    fn timeout(&self) -> Option<Duration>;
}
