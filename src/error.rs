//! Error types
//!
//! One enum per failure class: client input, resource lookup, and startup.
//! Transport failures stay as `std::io::Error` and are handled where the
//! connection lives.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

use crate::http::response::StatusCode;

/// Why the path sanitizer refused a request-target
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("path traversal sequence in request-target")]
    Traversal,

    #[error("disallowed character {0:?} in request-target")]
    InvalidCharacter(char),
}

/// Client input errors. Always answered, then the connection is closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("request-target rejected: {0}")]
    Rejected(#[from] Rejection),
}

impl RequestError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequestLine | Self::Rejected(Rejection::Traversal) => {
                StatusCode::BadRequest
            }
            Self::Rejected(Rejection::InvalidCharacter(_)) => StatusCode::Forbidden,
            Self::UnsupportedMethod(_) => StatusCode::NotImplemented,
        }
    }
}

/// File lookup failures, recovered locally with a 404 or 403
#[derive(Error, Debug)]
pub enum FileError {
    #[error("file not found")]
    NotFound,

    #[error("file exists but is not readable: {0}")]
    Unreadable(#[source] io::Error),

    #[error("file I/O error: {0}")]
    Io(#[source] io::Error),
}

impl FileError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unreadable(_) => StatusCode::Forbidden,
            Self::NotFound | Self::Io(_) => StatusCode::NotFound,
        }
    }
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Unreadable(err),
            _ => Self::Io(err),
        }
    }
}

/// Errors that stop the server before it serves anything
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("document root {path} is not an existing directory")]
    InvalidDocumentRoot { path: String },

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to initialise logging: {0}")]
    Logger(String),
}
