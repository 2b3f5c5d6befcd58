use crate::domain::model::Fault;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response: {message}")]
    Protocol { message: String },

    #[error("Remote fault {}: {}", .0.code, .0.message)]
    Fault(Fault),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Protocol,
    Remote,
    Configuration,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a failed call. Never 0.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl RpcError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::HttpStatus { .. } => ErrorCategory::Transport,
            Self::Xml(_) | Self::Json(_) | Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Fault(_) => ErrorCategory::Remote,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Validation { .. } => ErrorCategory::Local,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Remote => ErrorSeverity::High,
            ErrorCategory::Transport | ErrorCategory::Protocol => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Local => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_connect() => {
                "Could not connect to the services endpoint".to_string()
            }
            Self::Http(e) if e.is_timeout() => "The services endpoint did not answer in time".to_string(),
            Self::Fault(fault) => format!("{} ({})", fault.message, fault.kind()),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Http(_) => "Check that services are running and the endpoint URL is correct",
            Self::HttpStatus { .. } => "Check the endpoint path matches the xmlrpc/jsonrpc block of the services configuration",
            Self::Xml(_) | Self::Json(_) | Self::Protocol { .. } => {
                "Make sure the selected transport matches the endpoint"
            }
            Self::Fault(_) => "Check the service name, command and authcookie",
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the command line flags or the profile file"
            }
            Self::Io(_) => "Check file permissions and paths",
            Self::Validation { .. } => "Check the arguments passed to the call",
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
