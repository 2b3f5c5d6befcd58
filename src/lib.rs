pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Commands};
pub use config::ClientConfig;

pub use adapters::{JsonRpcTransport, RpcTransport, XmlRpcTransport};
pub use core::{alis::AlisQuery, client::AthemeClient, invoke::Invoker};
pub use domain::model::{CommandRequest, Fault, FaultCode, MethodCall, Value};
pub use utils::error::{Result, RpcError};
