#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::{ConfigProvider, TransportKind};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use toml_config::Profile;

pub const DEFAULT_XMLRPC_ENDPOINT: &str = "http://127.0.0.1:8080/xmlrpc";
pub const DEFAULT_JSONRPC_ENDPOINT: &str = "http://127.0.0.1:8080/jsonrpc";
pub const DEFAULT_SOURCE_IP: &str = "::1";

pub fn default_endpoint(transport: TransportKind) -> &'static str {
    match transport {
        TransportKind::Xmlrpc => DEFAULT_XMLRPC_ENDPOINT,
        TransportKind::Jsonrpc => DEFAULT_JSONRPC_ENDPOINT,
    }
}

/// Session fields sent with `atheme.command` when the caller gives none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub authcookie: String,
    pub account: String,
    pub source_ip: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            authcookie: String::new(),
            account: String::new(),
            source_ip: DEFAULT_SOURCE_IP.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub transport: TransportKind,
    pub timeout_seconds: Option<u64>,
    pub session: SessionDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_profile(&Profile::default())
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            timeout_seconds: None,
            session: SessionDefaults::default(),
        }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        let transport = profile.server.transport.unwrap_or_default();
        let defaults = SessionDefaults::default();

        Self {
            endpoint: profile
                .server
                .endpoint
                .clone()
                .unwrap_or_else(|| default_endpoint(transport).to_string()),
            transport,
            timeout_seconds: profile.server.timeout_seconds,
            session: SessionDefaults {
                authcookie: profile.session.authcookie.clone().unwrap_or(defaults.authcookie),
                account: profile.session.account.clone().unwrap_or(defaults.account),
                source_ip: profile.session.source_ip.clone().unwrap_or(defaults.source_ip),
            },
        }
    }
}

impl ConfigProvider for ClientConfig {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport(&self) -> TransportKind {
        self.transport
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("server.endpoint", &self.endpoint)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_positive_number("server.timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}
