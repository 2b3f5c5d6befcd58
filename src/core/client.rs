use crate::core::{CommandRequest, IsOnResult, MethodCall, Result, Transport, Value};
use crate::utils::error::RpcError;

/// Typed wrapper around the `atheme.*` methods of the services' RPC interface.
///
/// Every argument goes on the wire exactly as given; validation of
/// parameters, sessions and commands happens on the server.
pub struct AthemeClient<T: Transport> {
    transport: T,
}

impl<T: Transport> AthemeClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn call(&self, request: &MethodCall) -> Result<Value> {
        tracing::info!("Calling {}", request.method);
        self.transport.call(request).await
    }

    /// `atheme.command`: runs a service command and returns its reply.
    pub async fn command(&self, request: &CommandRequest) -> Result<Value> {
        tracing::debug!("{} {} with {} params", request.service, request.command, request.params.len());
        self.call(&MethodCall::with_params("atheme.command", request.to_args()))
            .await
    }

    /// `atheme.login`: returns a fresh authcookie.
    pub async fn login(&self, account: &str, password: &str, source_ip: Option<&str>) -> Result<String> {
        let mut call = MethodCall::new("atheme.login").arg(account).arg(password);
        if let Some(source_ip) = source_ip {
            call = call.arg(source_ip);
        }
        expect_string(&call.method, self.call(&call).await?)
    }

    pub async fn logout(&self, authcookie: &str, account: &str) -> Result<String> {
        let call = MethodCall::with_params("atheme.logout", [authcookie, account]);
        expect_string(&call.method, self.call(&call).await?)
    }

    /// `atheme.privset`: the operator privileges of the account, empty when
    /// it has none.
    pub async fn privset(&self, authcookie: &str, account: &str) -> Result<String> {
        let call = MethodCall::with_params("atheme.privset", [authcookie, account]);
        expect_string(&call.method, self.call(&call).await?)
    }

    pub async fn ison(&self, nick: &str) -> Result<IsOnResult> {
        let value = self.call(&MethodCall::new("atheme.ison").arg(nick)).await?;
        parse_ison(&value)
    }

    /// `atheme.metadata`: looks up `key` on an account, UID or channel.
    pub async fn metadata(&self, target: &str, key: &str) -> Result<String> {
        let call = MethodCall::with_params("atheme.metadata", [target, key]);
        expect_string(&call.method, self.call(&call).await?)
    }
}

fn expect_string(method: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(RpcError::protocol(format!(
            "{} returned {} instead of a string",
            method, other
        ))),
    }
}

// XML-RPC answers with two params (boolean, account), JSON-RPC with an object.
fn parse_ison(value: &Value) -> Result<IsOnResult> {
    let (online, account) = match value {
        Value::Array(items) if items.len() == 2 => (items[0].as_bool(), items[1].as_str()),
        Value::Struct(_) => (
            value.get("online").and_then(Value::as_bool),
            value.get("accountname").and_then(Value::as_str),
        ),
        _ => (None, None),
    };

    match (online, account) {
        (Some(online), Some(account)) => Ok(IsOnResult {
            online,
            account: (account != "*").then(|| account.to_string()),
        }),
        _ => Err(RpcError::protocol(format!(
            "atheme.ison returned an unexpected value: {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Fault;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct MockTransport {
        calls: Mutex<Vec<MethodCall>>,
        reply: std::result::Result<Value, Fault>,
    }

    impl MockTransport {
        fn replying(reply: Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Ok(reply),
            }
        }

        fn faulting(fault: Fault) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply: Err(fault),
            }
        }

        fn calls(&self) -> Vec<MethodCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn call(&self, request: &MethodCall) -> Result<Value> {
            self.calls.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(RpcError::Fault)
        }
    }

    #[tokio::test]
    async fn test_command_sends_args_in_order() {
        let client = AthemeClient::new(MockTransport::replying(Value::from("End of output")));
        let request = CommandRequest::new("ALIS", "LIST").source_ip("::1").param("*");

        let value = client.command(&request).await.unwrap();

        assert_eq!(value, Value::from("End of output"));
        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            MethodCall::with_params("atheme.command", ["", "", "::1", "ALIS", "LIST", "*"])
        );
    }

    #[tokio::test]
    async fn test_login_passes_optional_source_ip() {
        let client = AthemeClient::new(MockTransport::replying(Value::from("cookie123")));

        assert_eq!(client.login("jilles", "hunter2", None).await.unwrap(), "cookie123");
        assert_eq!(
            client.login("jilles", "hunter2", Some("10.0.0.1")).await.unwrap(),
            "cookie123"
        );

        let calls = client.transport().calls();
        assert_eq!(calls[0].params.len(), 2);
        assert_eq!(calls[1].params[2], Value::from("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_fault_propagates_unchanged() {
        let client = AthemeClient::new(MockTransport::faulting(Fault::new(
            3,
            "Invalid service name.",
        )));

        let err = client
            .command(&CommandRequest::new("NOPE", "LIST"))
            .await
            .unwrap_err();
        match err {
            RpcError::Fault(fault) => assert_eq!(fault.message, "Invalid service name."),
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_string_methods_reject_other_values() {
        let client = AthemeClient::new(MockTransport::replying(Value::Int(1)));
        let result = tokio_test::block_on(client.metadata("#atheme", "url"));
        assert!(matches!(result, Err(RpcError::Protocol { .. })));
    }

    #[test]
    fn test_parse_ison_array_and_struct() {
        let offline = Value::Array(vec![Value::Boolean(false), Value::from("*")]);
        assert_eq!(
            parse_ison(&offline).unwrap(),
            IsOnResult {
                online: false,
                account: None
            }
        );

        let mut members = BTreeMap::new();
        members.insert("online".to_string(), Value::Boolean(true));
        members.insert("accountname".to_string(), Value::from("jilles"));
        assert_eq!(
            parse_ison(&Value::Struct(members)).unwrap(),
            IsOnResult {
                online: true,
                account: Some("jilles".to_string())
            }
        );

        assert!(parse_ison(&Value::from("yes")).is_err());
    }
}
