use crate::adapters::http;
use crate::domain::model::{Fault, MethodCall, Value, DATETIME_FORMAT};
use crate::domain::ports::Transport;
use crate::utils::error::{Result, RpcError};
use async_trait::async_trait;
use base64::Engine;
use chrono::NaiveDateTime;
use quick_xml::escape::partial_escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "text/xml";

/// Serializes a call as an XML-RPC `methodCall` document.
///
/// Only `&`, `<` and `>` are escaped; the services' request parser reads
/// everything else verbatim, including non-ASCII bytes. Each `<value>` is
/// immediately followed by its type tag, which that parser requires.
pub fn encode_call(call: &MethodCall) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall>\n<methodName>");
    out.push_str(&partial_escape(call.method.as_str()));
    out.push_str("</methodName>\n<params>\n");
    for param in &call.params {
        out.push_str("<param><value>");
        encode_value(&mut out, param);
        out.push_str("</value></param>\n");
    }
    out.push_str("</params>\n</methodCall>\n");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&partial_escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Int(i) if i32::try_from(*i).is_ok() => {
            out.push_str(&format!("<int>{}</int>", i));
        }
        Value::Int(i) => out.push_str(&format!("<i8>{}</i8>", i)),
        Value::Boolean(b) => {
            out.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" })
        }
        Value::Double(d) => out.push_str(&format!("<double>{}</double>", d)),
        Value::DateTime(dt) => out.push_str(&format!(
            "<dateTime.iso8601>{}</dateTime.iso8601>",
            dt.format(DATETIME_FORMAT)
        )),
        Value::Base64(bytes) => out.push_str(&format!(
            "<base64>{}</base64>",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )),
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                out.push_str("<value>");
                encode_value(out, item);
                out.push_str("</value>");
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, item) in members {
                out.push_str("<member><name>");
                out.push_str(&partial_escape(name.as_str()));
                out.push_str("</name><value>");
                encode_value(out, item);
                out.push_str("</value></member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
}

/// Parses a `methodResponse` document.
///
/// One `<param>` yields its value, several yield an array of them. A
/// `<fault>` becomes [`RpcError::Fault`].
pub fn decode_response(body: &str) -> Result<Value> {
    let mut parser = Parser::new(tokenize(body)?);
    parser.expect_open("methodResponse")?;

    let result = match parser.next_open()?.as_str() {
        "params" => {
            let mut values = Vec::new();
            while parser.peek_open() == Some("param") {
                parser.expect_open("param")?;
                values.push(parser.parse_value()?);
                parser.expect_close("param")?;
            }
            parser.expect_close("params")?;
            match values.len() {
                0 => return Err(RpcError::protocol("response carries no value")),
                1 => Ok(values.remove(0)),
                _ => Ok(Value::Array(values)),
            }
        }
        "fault" => {
            let fault = fault_from_value(parser.parse_value()?)?;
            parser.expect_close("fault")?;
            Err(RpcError::Fault(fault))
        }
        other => {
            return Err(RpcError::protocol(format!(
                "unexpected <{}> in methodResponse",
                other
            )))
        }
    };

    parser.expect_close("methodResponse")?;
    parser.expect_end()?;
    result
}

fn fault_from_value(value: Value) -> Result<Fault> {
    let code = value
        .get("faultCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::protocol("fault without integer faultCode"))?;
    let message = value
        .get("faultString")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::protocol("fault without faultString"))?;
    Ok(Fault::new(code, message))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(String),
    Close(String),
    Text(String),
}

fn tokenize(body: &str) -> Result<Vec<Token>> {
    let mut reader = Reader::from_str(body);
    let mut tokens = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => tokens.push(Token::Open(tag_name(e.name().as_ref()))),
            Event::End(e) => tokens.push(Token::Close(tag_name(e.name().as_ref()))),
            Event::Empty(e) => {
                let name = tag_name(e.name().as_ref());
                tokens.push(Token::Open(name.clone()));
                tokens.push(Token::Close(name));
            }
            Event::Text(e) => push_text(&mut tokens, &e.unescape()?),
            Event::CData(e) => push_text(&mut tokens, &String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(tokens)
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if let Some(Token::Text(previous)) = tokens.last_mut() {
        previous.push_str(text);
    } else {
        tokens.push(Token::Text(text.to_string()));
    }
}

/// The services encode every byte above 127 as its own `&#N;` reference,
/// so UTF-8 text arrives as one char per byte. Reassemble it when the
/// bytes form valid UTF-8.
fn repair_byte_refs(text: String) -> String {
    if text.is_ascii() || text.chars().any(|c| c as u32 > 0xff) {
        return text;
    }
    let bytes: Vec<u8> = text.chars().map(|c| c as u8).collect();
    String::from_utf8(bytes).unwrap_or(text)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while let Some(Token::Text(text)) = self.tokens.get(self.pos) {
            if !text.trim().is_empty() {
                break;
            }
            self.pos += 1;
        }
    }

    fn peek_open(&mut self) -> Option<&str> {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            Some(Token::Open(name)) => Some(name),
            _ => None,
        }
    }

    fn next_open(&mut self) -> Result<String> {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            Some(Token::Open(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            other => Err(unexpected("an element", other)),
        }
    }

    fn expect_open(&mut self, expected: &str) -> Result<()> {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            Some(Token::Open(name)) if name == expected => {
                self.pos += 1;
                Ok(())
            }
            other => Err(unexpected(&format!("<{}>", expected), other)),
        }
    }

    fn expect_close(&mut self, expected: &str) -> Result<()> {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            Some(Token::Close(name)) if name == expected => {
                self.pos += 1;
                Ok(())
            }
            other => Err(unexpected(&format!("</{}>", expected), other)),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.tokens.get(self.pos) {
            None => Ok(()),
            other => Err(unexpected("end of document", other)),
        }
    }

    /// Raw text at the cursor, empty when the next token is markup.
    fn text(&mut self) -> String {
        match self.tokens.get(self.pos) {
            Some(Token::Text(text)) => {
                self.pos += 1;
                text.clone()
            }
            _ => String::new(),
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.expect_open("value")?;

        let leading = self.text();
        if let Some(Token::Close(name)) = self.tokens.get(self.pos) {
            if name == "value" {
                self.pos += 1;
                return Ok(Value::String(repair_byte_refs(leading)));
            }
        }
        if !leading.trim().is_empty() {
            return Err(RpcError::protocol("mixed text and markup inside <value>"));
        }

        let kind = self.next_open()?;
        let value = match kind.as_str() {
            "string" => Value::String(repair_byte_refs(self.text())),
            "int" | "i4" | "i8" => {
                let text = self.text();
                Value::Int(text.trim().parse().map_err(|_| {
                    RpcError::protocol(format!("invalid integer '{}'", text.trim()))
                })?)
            }
            "boolean" => match self.text().trim() {
                "1" | "true" => Value::Boolean(true),
                "0" | "false" => Value::Boolean(false),
                other => return Err(RpcError::protocol(format!("invalid boolean '{}'", other))),
            },
            "double" => {
                let text = self.text();
                Value::Double(text.trim().parse().map_err(|_| {
                    RpcError::protocol(format!("invalid double '{}'", text.trim()))
                })?)
            }
            "dateTime.iso8601" => {
                let text = self.text();
                Value::DateTime(parse_datetime(text.trim())?)
            }
            "base64" => {
                let text: String = self.text().split_whitespace().collect();
                Value::Base64(
                    base64::engine::general_purpose::STANDARD
                        .decode(text)
                        .map_err(|e| RpcError::protocol(format!("invalid base64: {}", e)))?,
                )
            }
            "nil" => Value::Nil,
            "array" => {
                self.expect_open("data")?;
                let mut items = Vec::new();
                while self.peek_open() == Some("value") {
                    items.push(self.parse_value()?);
                }
                self.expect_close("data")?;
                Value::Array(items)
            }
            "struct" => {
                let mut members = BTreeMap::new();
                while self.peek_open() == Some("member") {
                    self.expect_open("member")?;
                    self.expect_open("name")?;
                    let name = repair_byte_refs(self.text());
                    self.expect_close("name")?;
                    let item = self.parse_value()?;
                    self.expect_close("member")?;
                    members.insert(name, item);
                }
                Value::Struct(members)
            }
            other => return Err(RpcError::protocol(format!("unknown value type <{}>", other))),
        };

        self.expect_close(&kind)?;
        self.expect_close("value")?;
        Ok(value)
    }
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| RpcError::protocol(format!("invalid dateTime.iso8601 '{}'", text)))
}

fn unexpected(expected: &str, found: Option<&Token>) -> RpcError {
    let found = match found {
        Some(Token::Open(name)) => format!("<{}>", name),
        Some(Token::Close(name)) => format!("</{}>", name),
        Some(Token::Text(text)) => format!("text '{}'", text.trim()),
        None => "end of document".to_string(),
    };
    RpcError::protocol(format!("expected {}, found {}", expected, found))
}

/// XML-RPC over HTTP POST.
#[derive(Debug, Clone)]
pub struct XmlRpcTransport {
    client: Client,
    endpoint: String,
}

impl XmlRpcTransport {
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for XmlRpcTransport {
    async fn call(&self, request: &MethodCall) -> Result<Value> {
        tracing::debug!(
            "XML-RPC call {} with {} params",
            request.method,
            request.params.len()
        );
        let body = http::post(&self.client, &self.endpoint, CONTENT_TYPE, encode_call(request)).await?;
        decode_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRING_RESPONSE: &str = "<?xml version=\"1.0\"?>\r\n<methodResponse>\r\n<params>\r\n <param>\r\n  <value>\r\n   <string>Returning maximum of 60 channel names matching '*'\nEnd of output</string>\r\n  </value>\r\n </param>\r\n</params>\r\n</methodResponse>";

    #[test]
    fn test_encode_command_call() {
        let call = MethodCall::with_params("atheme.command", ["", "", "::1", "ALIS", "LIST", "*"]);
        let xml = encode_call(&call);

        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<methodName>atheme.command</methodName>"));
        assert_eq!(xml.matches("<param>").count(), 6);
        assert!(xml.contains("<param><value><string></string></value></param>"));
        assert!(xml.contains("<value><string>::1</string></value>"));
        assert!(xml.contains("<value><string>ALIS</string></value>"));
        assert!(xml.contains("<value><string>*</string></value>"));
    }

    #[test]
    fn test_encode_escapes_markup_only() {
        let call = MethodCall::new("atheme.command").arg("a<b & \"c\" 'd' é");
        let xml = encode_call(&call);
        assert!(xml.contains("<string>a&lt;b &amp; \"c\" 'd' é</string>"));
    }

    #[test]
    fn test_encode_compound_values() {
        let mut members = BTreeMap::new();
        members.insert("n".to_string(), Value::Int(1 << 40));
        let call = MethodCall::new("x")
            .arg(Value::Array(vec![Value::Boolean(true), Value::Nil]))
            .arg(Value::Struct(members));
        let xml = encode_call(&call);
        assert!(xml.contains("<array><data><value><boolean>1</boolean></value><value><nil/></value></data></array>"));
        assert!(xml.contains("<struct><member><name>n</name><value><i8>1099511627776</i8></value></member></struct>"));
    }

    #[test]
    fn test_decode_string_response() {
        let value = decode_response(STRING_RESPONSE).unwrap();
        assert_eq!(
            value,
            Value::String("Returning maximum of 60 channel names matching '*'\nEnd of output".into())
        );
    }

    #[test]
    fn test_decode_preserves_string_whitespace() {
        let body = "<methodResponse><params><param><value><string>  padded  </string></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from("  padded  "));
    }

    #[test]
    fn test_decode_untyped_and_empty_values() {
        let body = "<methodResponse><params><param><value>plain</value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from("plain"));

        let body = "<methodResponse><params><param><value><string/></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from(""));

        let body = "<methodResponse><params><param><value></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from(""));
    }

    #[test]
    fn test_decode_fault() {
        let body = "<?xml version=\"1.0\"?>\r\n<methodResponse>\r\n <fault>\r\n  <value>\r\n   <struct>\r\n    <member>\r\n     <name>faultCode</name>\r\n     <value><int>3</int></value>\r\n    </member>\r\n    <member>\r\n     <name>faultString</name>\r\n     <value><string>Invalid service name.</string></value>\r\n    </member>\r\n   </struct>\r\n  </value>\r\n </fault>\r\n</methodResponse>";

        match decode_response(body) {
            Err(RpcError::Fault(fault)) => {
                assert_eq!(fault.code, 3);
                assert_eq!(fault.message, "Invalid service name.");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_multiple_params_as_array() {
        let body = "<?xml version=\"1.0\"?>\r\n<methodResponse>\r\n<params>\r\n <param>\r\n  <value>\r\n   <boolean>1</boolean>\r\n  </value>\r\n </param>\r\n <param>\r\n  <value>\r\n   <string>jilles</string>\r\n  </value>\r\n </param>\r\n</params>\r\n</methodResponse>";
        assert_eq!(
            decode_response(body).unwrap(),
            Value::Array(vec![Value::Boolean(true), Value::from("jilles")])
        );
    }

    #[test]
    fn test_decode_scalar_types() {
        let body = "<methodResponse><params><param><value><array><data>\
            <value><i4>-7</i4></value>\
            <value><double>1.5</double></value>\
            <value><dateTime.iso8601>20051104T06:56:15</dateTime.iso8601></value>\
            <value><base64>aGVsbG8=</base64></value>\
            <value><nil/></value>\
            </data></array></value></param></params></methodResponse>";

        let value = decode_response(body).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items[0], Value::Int(-7));
        assert_eq!(items[1], Value::Double(1.5));
        assert_eq!(items[2].to_string(), "20051104T06:56:15");
        assert_eq!(items[3], Value::Base64(b"hello".to_vec()));
        assert_eq!(items[4], Value::Nil);
    }

    #[test]
    fn test_decode_byte_references_as_utf8() {
        let body = "<methodResponse><params><param><value><string>caf&#195;&#169; &amp; co</string></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::from("café & co"));
    }

    #[test]
    fn test_decode_rejects_malformed_documents() {
        assert!(matches!(
            decode_response("<html><body>404</body></html>"),
            Err(RpcError::Protocol { .. })
        ));
        assert!(matches!(
            decode_response("<methodResponse><params></params></methodResponse>"),
            Err(RpcError::Protocol { .. })
        ));
        assert!(matches!(
            decode_response("<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>"),
            Err(RpcError::Protocol { .. })
        ));
        assert!(decode_response("<methodResponse><params>").is_err());
    }
}
