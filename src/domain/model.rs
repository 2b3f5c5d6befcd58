use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A value as carried by XML-RPC (and, where representable, JSON-RPC).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Boolean(bool),
    Double(f64),
    DateTime(NaiveDateTime),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// Strings print bare at the top level so a command reply reaches stdout untouched.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Double(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::Base64(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_nested(f, item)?;
                }
                f.write_str("]")
            }
            Value::Struct(members) => {
                f.write_str("{")?;
                for (i, (name, item)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", name)?;
                    write_nested(f, item)?;
                }
                f.write_str("}")
            }
            Value::Nil => f.write_str("nil"),
        }
    }
}

fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{:?}", s),
        other => write!(f, "{}", other),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::DateTime(dt) => {
                serializer.serialize_str(&dt.format(DATETIME_FORMAT).to_string())
            }
            Value::Base64(bytes) => {
                use base64::Engine;
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Value::Array(items) => items.serialize(serializer),
            Value::Struct(members) => members.serialize(serializer),
            Value::Nil => serializer.serialize_unit(),
        }
    }
}

/// Wire format of `dateTime.iso8601`.
pub const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, V>(method: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            method: method.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Error response returned by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FaultCode {
        FaultCode::from(self.code)
    }
}

/// Fault codes published by the services for their RPC interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    NeedMoreParams,
    BadParams,
    NoSuchSource,
    NoSuchTarget,
    AuthFail,
    NoPrivs,
    NoSuchKey,
    AlreadyExists,
    TooMany,
    EmailFail,
    NotVerified,
    NoChange,
    AlreadyAuthed,
    Unimplemented,
    BadAuthCookie,
    Other(i64),
}

impl From<i64> for FaultCode {
    fn from(code: i64) -> Self {
        match code {
            1 => FaultCode::NeedMoreParams,
            2 => FaultCode::BadParams,
            3 => FaultCode::NoSuchSource,
            4 => FaultCode::NoSuchTarget,
            5 => FaultCode::AuthFail,
            6 => FaultCode::NoPrivs,
            7 => FaultCode::NoSuchKey,
            8 => FaultCode::AlreadyExists,
            9 => FaultCode::TooMany,
            10 => FaultCode::EmailFail,
            11 => FaultCode::NotVerified,
            12 => FaultCode::NoChange,
            13 => FaultCode::AlreadyAuthed,
            14 => FaultCode::Unimplemented,
            15 => FaultCode::BadAuthCookie,
            other => FaultCode::Other(other),
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultCode::NeedMoreParams => "needmoreparams",
            FaultCode::BadParams => "badparams",
            FaultCode::NoSuchSource => "nosuch_source",
            FaultCode::NoSuchTarget => "nosuch_target",
            FaultCode::AuthFail => "authfail",
            FaultCode::NoPrivs => "noprivs",
            FaultCode::NoSuchKey => "nosuch_key",
            FaultCode::AlreadyExists => "alreadyexists",
            FaultCode::TooMany => "toomany",
            FaultCode::EmailFail => "emailfail",
            FaultCode::NotVerified => "notverified",
            FaultCode::NoChange => "nochange",
            FaultCode::AlreadyAuthed => "already_authed",
            FaultCode::Unimplemented => "unimplemented",
            FaultCode::BadAuthCookie => "badauthcookie",
            FaultCode::Other(code) => return write!(f, "fault {}", code),
        };
        f.write_str(name)
    }
}

/// Arguments of `atheme.command`, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub authcookie: String,
    pub account: String,
    pub source_ip: String,
    pub service: String,
    pub command: String,
    pub params: Vec<String>,
}

impl CommandRequest {
    pub fn new(service: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            authcookie: String::new(),
            account: String::new(),
            source_ip: String::new(),
            service: service.into(),
            command: command.into(),
            params: Vec::new(),
        }
    }

    pub fn session(mut self, authcookie: impl Into<String>, account: impl Into<String>) -> Self {
        self.authcookie = authcookie.into();
        self.account = account.into();
        self
    }

    pub fn source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self
    }

    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            self.authcookie.clone(),
            self.account.clone(),
            self.source_ip.clone(),
            self.service.clone(),
            self.command.clone(),
        ];
        args.extend(self.params.iter().cloned());
        args
    }
}

/// Reply of `atheme.ison`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsOnResult {
    pub online: bool,
    /// `None` when the nick is not identified to an account.
    pub account: Option<String>,
}

impl fmt::Display for IsOnResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.online, &self.account) {
            (false, _) => f.write_str("offline"),
            (true, None) => f.write_str("online, not identified"),
            (true, Some(account)) => write!(f, "online, identified to {}", account),
        }
    }
}
