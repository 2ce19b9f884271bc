// Error taxonomy for every Gateway call.
//
// Each variant is terminal for the call that produced it: nothing here is
// retried. The binary maps any of them to a non-zero exit code.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CgError>;

#[derive(Debug, Error)]
pub enum CgError {
    /// The endpoint points at a host the client refuses to talk to.
    #[error("\"{url}\" is an invalid URL: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection refused, bad scheme, or an HTTP failure without a JSON body.
    #[error("problem with API url \"{url}\" - is it entered correctly? ({detail})")]
    Transport { url: String, detail: String },

    #[error("request to \"{url}\" timed out")]
    Timeout { url: String },

    /// The Gateway answered, but not with a usable envelope.
    #[error("response JSON failed to create: {reason}")]
    MalformedResponse { reason: String },

    #[error("request failed\nError {code}: \"{message}\"")]
    Gateway { code: i64, message: String },

    #[error("config file incorrectly formatted{}: {reason}", path_suffix(.path))]
    InvalidConfig {
        path: Option<PathBuf>,
        reason: String,
    },

    /// A success envelope that lacks the field the operation returns.
    #[error("{operation} failed: response has no \"{field}\"")]
    MissingResult {
        operation: String,
        field: &'static str,
    },

    #[error("no {name} given (use --{flag} or set {env})")]
    MissingSetting {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" (\"{}\")", p.display()),
        None => String::new(),
    }
}

impl CgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CgError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        CgError::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(path: Option<PathBuf>, reason: impl Into<String>) -> Self {
        CgError::InvalidConfig {
            path,
            reason: reason.into(),
        }
    }

    /// Process exit code for this failure. Every kind is a plain failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
