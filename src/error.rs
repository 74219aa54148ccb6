use std::fmt;
use std::io;

use bitcoincore_rpc::jsonrpc;

/// Crate errors
#[derive(Debug)]
pub enum Error {
    /// No command matched the given token
    UnknownCommand(String),
    /// A required parameter is still empty after prompting
    MissingParameter {
        command: String,
        param: String,
    },
    /// A parameter value failed validation
    Validation {
        param: String,
        value: String,
        reason: String,
    },
    /// Connection level failure (DNS, refused, timeout)
    Transport(String),
    /// Explorer answered with a non-2xx status
    Rest {
        status: u16,
        body: String,
    },
    /// The node answered with a json-rpc `error` object
    Rpc {
        code: i32,
        message: String,
    },
    /// A multi-step flow could not continue with what the node returned
    Backend(String),
    /// Malformed configuration
    Config(String),
    /// I/O
    Io(io::Error),
    /// Json (de)serialization
    Json(serde_json::Error),
    /// Any other rpc client error
    CoreRpc(bitcoincore_rpc::Error),
}

impl Error {
    /// Whether this error is a usage problem, i.e. the fix is on the command line.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UnknownCommand(_) | Self::MissingParameter { .. })
    }

    /// Creates a validation error
    pub fn invalid(param: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<bitcoincore_rpc::Error> for Error {
    fn from(e: bitcoincore_rpc::Error) -> Self {
        match e {
            bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Rpc(e)) => Self::Rpc {
                code: e.code,
                message: e.message,
            },
            bitcoincore_rpc::Error::JsonRpc(jsonrpc::Error::Transport(e)) => {
                Self::Transport(e.to_string())
            }
            e => Self::CoreRpc(e),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(source_chain(&e))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(s) if s.is_empty() => f.write_str("no command given"),
            Self::UnknownCommand(s) => write!(f, "unknown command: {s}"),
            Self::MissingParameter { command, param } => {
                write!(f, "{command}: missing required parameter <{param}>")
            }
            Self::Validation {
                param,
                value,
                reason,
            } => write!(f, "invalid {param} \"{value}\": {reason}"),
            Self::Transport(s) => write!(f, "transport error: {s}"),
            Self::Rest { status, body } => write!(f, "explorer returned status {status}: {body}"),
            Self::Rpc { code, message } => write!(f, "rpc error {code}: {message}"),
            Self::Backend(s) => f.write_str(s),
            Self::Config(s) => write!(f, "config: {s}"),
            Self::Io(e) => write!(f, "{e}"),
            Self::Json(e) => write!(f, "{e}"),
            Self::CoreRpc(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

/// Joins an error with all of its sources, outermost first.
fn source_chain(e: &dyn std::error::Error) -> String {
    let mut s = e.to_string();
    let mut cause = e.source();
    while let Some(inner) = cause {
        s.push_str(": ");
        s.push_str(&inner.to_string());
        cause = inner.source();
    }
    s
}

/// Crate `Result` type
pub type Result<T, E = Error> = core::result::Result<T, E>;
