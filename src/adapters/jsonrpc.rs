use crate::adapters::http;
use crate::domain::model::{Fault, MethodCall, Value};
use crate::domain::ports::Transport;
use crate::utils::error::{Result, RpcError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<&'a str>,
    id: String,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

/// Serializes a call as a JSON-RPC request. The services only accept string
/// params, so anything else is rejected before it goes on the wire.
pub fn encode_call(call: &MethodCall, id: &str) -> Result<String> {
    let params = call
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            param.as_str().ok_or_else(|| RpcError::Validation {
                message: format!("JSON-RPC param {} of {} is not a string", i, call.method),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let request = Request {
        jsonrpc: "2.0",
        method: &call.method,
        params,
        id: id.to_string(),
    };
    Ok(serde_json::to_string(&request)?)
}

pub fn decode_response(body: &str) -> Result<Value> {
    let response: Response = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(RpcError::Fault(Fault::new(error.code, error.message)));
    }

    Ok(from_json(response.result))
}

pub fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        serde_json::Value::Object(members) => Value::Struct(
            members
                .into_iter()
                .map(|(name, item)| (name, from_json(item)))
                .collect(),
        ),
    }
}

/// JSON-RPC over HTTP POST. Request ids count up from 1 per transport.
#[derive(Debug)]
pub struct JsonRpcTransport {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    async fn call(&self, request: &MethodCall) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        tracing::debug!("JSON-RPC call {} (id {})", request.method, id);
        let body = encode_call(request, &id)?;
        let text = http::post(&self.client, &self.endpoint, CONTENT_TYPE, body).await?;
        decode_response(&text)
    }
}
