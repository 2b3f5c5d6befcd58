use crate::core::TransportKind;
use crate::utils::error::{Result, RpcError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Connection profile read from a TOML file. Every field is optional; unset
/// ones fall back to the built-in defaults.
///
/// ```toml
/// [server]
/// endpoint = "http://services.example.net:8080/xmlrpc"
/// transport = "xmlrpc"
/// timeout_seconds = 10
///
/// [session]
/// authcookie = "${ATHEME_AUTHCOOKIE}"
/// account = "jilles"
/// source_ip = "::1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub endpoint: Option<String>,
    pub transport: Option<TransportKind>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    pub authcookie: Option<String>,
    pub account: Option<String>,
    pub source_ip: Option<String>,
}

impl Profile {
    /// Loads a profile from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading profile from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| RpcError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a profile from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RpcError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` references with environment values (e.g. `${ATHEME_AUTHCOOKIE}`).
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RpcError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!("Environment variable {} is not set", var_name);
                format!("${{{}}}", var_name)
            })
        });

        Ok(result.to_string())
    }
}
