use crate::config::toml_config::Profile;
use crate::config::{default_endpoint, ClientConfig, SessionDefaults};
use crate::core::alis::Show;
use crate::core::TransportKind;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

/// Stands in for passwords and authcookies in `Debug` output.
const REDACTED: &str = "<redacted>";

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| REDACTED)
}

#[derive(Debug, Clone, Parser)]
#[command(name = "atheme-rpc")]
#[command(about = "Call the XML-RPC / JSON-RPC interface of Atheme IRC services")]
#[command(
    long_about = "Call the XML-RPC / JSON-RPC interface of Atheme IRC services.\n\n\
    Without a subcommand, runs `ALIS LIST *` through atheme.command against \
    http://127.0.0.1:8080/xmlrpc and prints the reply."
)]
pub struct CliConfig {
    #[arg(long, global = true, help = "RPC endpoint URL")]
    pub endpoint: Option<String>,

    #[arg(long, value_enum, global = true, help = "Wire protocol")]
    pub transport: Option<TransportKind>,

    #[arg(long, global = true, help = "Request timeout in seconds (default: none)")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, help = "TOML profile with server and session defaults")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Write logs as JSON lines")]
    pub log_json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Session fields of `atheme.command`; unset ones come from the profile.
#[derive(Clone, Default, Args)]
pub struct SessionArgs {
    #[arg(long, help = "Authcookie from `login`")]
    pub cookie: Option<String>,

    #[arg(long, help = "Account the authcookie belongs to")]
    pub account: Option<String>,

    #[arg(long, help = "Address the command is attributed to [default: ::1]")]
    pub source_ip: Option<String>,
}

impl fmt::Debug for SessionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionArgs")
            .field("cookie", &redact(&self.cookie))
            .field("account", &self.account)
            .field("source_ip", &self.source_ip)
            .finish()
    }
}

impl SessionArgs {
    pub fn resolve(&self, defaults: &SessionDefaults) -> SessionDefaults {
        SessionDefaults {
            authcookie: self.cookie.clone().unwrap_or_else(|| defaults.authcookie.clone()),
            account: self.account.clone().unwrap_or_else(|| defaults.account.clone()),
            source_ip: self.source_ip.clone().unwrap_or_else(|| defaults.source_ip.clone()),
        }
    }
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Run a service command through atheme.command
    Command {
        #[command(flatten)]
        session: SessionArgs,
        /// Service name or nick, e.g. ALIS or NickServ
        service: String,
        /// Command name, e.g. LIST
        command: String,
        /// Command parameters, passed through unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
    /// Search channels with ALIS LIST
    Alis {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(default_value = "*")]
        mask: String,
        #[arg(long, help = "Minimum number of users")]
        min: Option<u32>,
        #[arg(long, help = "Maximum number of users")]
        max: Option<u32>,
        #[arg(long, help = "Skip the first N matches")]
        skip: Option<u32>,
        #[arg(long, allow_negative_numbers = true, help = "Cap on returned channels")]
        maxmatches: Option<i32>,
        #[arg(long, help = "Topic pattern")]
        topic: Option<String>,
        #[arg(long, value_enum, help = "Also show modes (m), topic setter (t) or both (mt)")]
        show: Option<Show>,
        #[arg(long, allow_hyphen_values = true, help = "Mode filter, e.g. +s, -k or =nt")]
        mode: Option<String>,
    },
    /// Log in with atheme.login and print the authcookie
    Login {
        account: String,
        password: String,
        #[arg(long, help = "Address the login is attributed to [default: profile, then ::1]")]
        source_ip: Option<String>,
    },
    /// Destroy an authcookie with atheme.logout
    Logout { authcookie: String, account: String },
    /// Print the operator privileges of an account
    Privset { authcookie: String, account: String },
    /// Check whether a nick is online and identified
    Ison { nick: String },
    /// Read a metadata key of an account, UID or channel
    Metadata { target: String, key: String },
    /// Call any method with string parameters
    Call {
        method: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
}

// Passwords and authcookies never reach the logs.
impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commands::Command {
                session,
                service,
                command,
                params,
            } => f
                .debug_struct("Command")
                .field("session", session)
                .field("service", service)
                .field("command", command)
                .field("params", params)
                .finish(),
            Commands::Alis {
                session,
                mask,
                min,
                max,
                skip,
                maxmatches,
                topic,
                show,
                mode,
            } => f
                .debug_struct("Alis")
                .field("session", session)
                .field("mask", mask)
                .field("min", min)
                .field("max", max)
                .field("skip", skip)
                .field("maxmatches", maxmatches)
                .field("topic", topic)
                .field("show", show)
                .field("mode", mode)
                .finish(),
            Commands::Login {
                account,
                password: _,
                source_ip,
            } => f
                .debug_struct("Login")
                .field("account", account)
                .field("password", &REDACTED)
                .field("source_ip", source_ip)
                .finish(),
            Commands::Logout { authcookie: _, account } => f
                .debug_struct("Logout")
                .field("authcookie", &REDACTED)
                .field("account", account)
                .finish(),
            Commands::Privset { authcookie: _, account } => f
                .debug_struct("Privset")
                .field("authcookie", &REDACTED)
                .field("account", account)
                .finish(),
            Commands::Ison { nick } => f.debug_struct("Ison").field("nick", nick).finish(),
            Commands::Metadata { target, key } => f
                .debug_struct("Metadata")
                .field("target", target)
                .field("key", key)
                .finish(),
            Commands::Call { method, params } => f
                .debug_struct("Call")
                .field("method", method)
                .field("params", params)
                .finish(),
        }
    }
}

impl CliConfig {
    /// Builds the client configuration: built-in defaults, then the
    /// profile, then flags given on the command line.
    pub fn resolve(&self) -> Result<ClientConfig> {
        let profile = match &self.config {
            Some(path) => Profile::from_file(path)?,
            None => Profile::default(),
        };
        let mut config = ClientConfig::from_profile(&profile);

        if let Some(transport) = self.transport {
            config.transport = transport;
            if profile.server.endpoint.is_none() {
                config.endpoint = default_endpoint(transport).to_string();
            }
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.timeout.is_some() {
            config.timeout_seconds = self.timeout;
        }

        Ok(config)
    }
}
