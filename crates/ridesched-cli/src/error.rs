//! CLI error types.

use std::fmt;

use ridesched_remote::RemoteError;

/// Result type for CLI commands.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a `ridesched` invocation.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration could not be loaded or is invalid.
    Config(String),
    /// The remote client could not be set up.
    Remote(RemoteError),
    /// IO error (reading a logo, writing output).
    Io(std::io::Error),
    /// An operation ran and reported failure.
    Operation(String),
    /// Command-line input could not be interpreted.
    Input(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Remote(err) => write!(f, "remote error: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Operation(msg) => write!(f, "operation failed: {}", msg),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RemoteError> for ClientError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}
