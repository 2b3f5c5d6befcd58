use crate::core::CommandRequest;
use crate::utils::error::{Result, RpcError};

pub const SERVICE: &str = "ALIS";
pub const LIST: &str = "LIST";

/// Which extra columns `-show` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Show {
    #[cfg_attr(feature = "cli", value(name = "m"))]
    Modes,
    #[cfg_attr(feature = "cli", value(name = "t"))]
    TopicSetter,
    #[cfg_attr(feature = "cli", value(name = "mt"))]
    Both,
}

impl Show {
    fn as_arg(self) -> &'static str {
        match self {
            Show::Modes => "m",
            Show::TopicSetter => "t",
            Show::Both => "mt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeMatch {
    /// Channel has all of the modes set.
    Set,
    /// Channel has none of the modes set.
    Unset,
    /// Channel modes are exactly these.
    Equal,
}

impl ModeMatch {
    /// Splits a `-mode` argument such as `+sk` into direction and letters.
    pub fn parse_arg(arg: &str) -> Result<(ModeMatch, String)> {
        let matching = match arg.chars().next() {
            Some('+') => ModeMatch::Set,
            Some('-') => ModeMatch::Unset,
            Some('=') => ModeMatch::Equal,
            _ => {
                return Err(RpcError::Validation {
                    message: format!("mode filter '{}' must start with +, - or =", arg),
                })
            }
        };
        Ok((matching, arg[1..].to_string()))
    }

    fn prefix(self) -> char {
        match self {
            ModeMatch::Set => '+',
            ModeMatch::Unset => '-',
            ModeMatch::Equal => '=',
        }
    }
}

/// Parameters of an `ALIS LIST` search.
///
/// Options are emitted after the mask in the order the listing service
/// parses them. Range checks happen server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlisQuery {
    mask: String,
    min_users: Option<u32>,
    max_users: Option<u32>,
    skip: Option<u32>,
    max_matches: Option<i32>,
    topic: Option<String>,
    show: Option<Show>,
    mode: Option<(ModeMatch, String)>,
}

impl Default for AlisQuery {
    fn default() -> Self {
        Self::new("*")
    }
}

impl AlisQuery {
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            mask: mask.into(),
            min_users: None,
            max_users: None,
            skip: None,
            max_matches: None,
            topic: None,
            show: None,
            mode: None,
        }
    }

    pub fn min_users(mut self, min: u32) -> Self {
        self.min_users = Some(min);
        self
    }

    pub fn max_users(mut self, max: u32) -> Self {
        self.max_users = Some(max);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// A negative value asks for the server's maximum.
    pub fn max_matches(mut self, max: i32) -> Self {
        self.max_matches = Some(max);
        self
    }

    pub fn topic(mut self, pattern: impl Into<String>) -> Self {
        self.topic = Some(pattern.into());
        self
    }

    pub fn show(mut self, show: Show) -> Self {
        self.show = Some(show);
        self
    }

    pub fn mode(mut self, matching: ModeMatch, modes: impl Into<String>) -> Self {
        self.mode = Some((matching, modes.into()));
        self
    }

    pub fn to_params(&self) -> Vec<String> {
        let mut params = vec![self.mask.clone()];

        if let Some(min) = self.min_users {
            params.extend(["-min".to_string(), min.to_string()]);
        }
        if let Some(max) = self.max_users {
            params.extend(["-max".to_string(), max.to_string()]);
        }
        if let Some(skip) = self.skip {
            params.extend(["-skip".to_string(), skip.to_string()]);
        }
        if let Some(max) = self.max_matches {
            params.extend(["-maxmatches".to_string(), max.to_string()]);
        }
        if let Some(topic) = &self.topic {
            params.extend(["-topic".to_string(), topic.clone()]);
        }
        if let Some(show) = self.show {
            params.extend(["-show".to_string(), show.as_arg().to_string()]);
        }
        if let Some((matching, modes)) = &self.mode {
            params.extend(["-mode".to_string(), format!("{}{}", matching.prefix(), modes)]);
        }

        params
    }

    /// The `atheme.command` request running this search.
    pub fn into_request(self) -> CommandRequest {
        CommandRequest::new(SERVICE, LIST).params(self.to_params())
    }
}
