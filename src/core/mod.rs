pub mod alis;
pub mod client;
pub mod invoke;

pub use crate::domain::model::{CommandRequest, Fault, IsOnResult, MethodCall, Value};
pub use crate::domain::ports::{ConfigProvider, Transport, TransportKind};
pub use crate::utils::error::Result;
