//! Error types for remote-service operations.
//!
//! Every failure inside the orchestration layer is a [`RemoteError`]; the
//! public operations turn them into [`OperationResult`](crate::OperationResult)
//! values instead of returning them.

use std::fmt;

use ridesched_core::IdentityError;
use thiserror::Error;

/// The category of a remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorCode {
    /// Malformed resource URL; never reaches the network.
    InvalidUrl,
    /// A session-scheme call was attempted with no session cookie held.
    AuthRequired,
    /// The login call did not yield a session cookie.
    AuthFailed,
    /// Cancel requested on an event that is already cancelled.
    AlreadyCancelled,
    /// Reinstate requested on an event that is not cancelled.
    NotCancelled,
    /// The remote service answered with a non-success status.
    RemoteError,
    /// The transport could not complete the request (connection, timeout).
    Transport,
    /// The remote service answered successfully but the body was unusable.
    InvalidResponse,
    /// Caller-supplied input failed validation.
    Validation,
    /// Missing or invalid configuration.
    Configuration,
}

impl RemoteErrorCode {
    /// Returns a stable machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::AuthRequired => "auth_required",
            Self::AuthFailed => "auth_failed",
            Self::AlreadyCancelled => "already_cancelled",
            Self::NotCancelled => "not_cancelled",
            Self::RemoteError => "remote_error",
            Self::Transport => "transport",
            Self::InvalidResponse => "invalid_response",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
        }
    }

    /// Returns true if this failure was detected before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl | Self::AuthRequired | Self::Validation | Self::Configuration
        )
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to the remote service.
#[derive(Debug, Error)]
pub struct RemoteError {
    code: RemoteErrorCode,
    message: String,
    /// HTTP status of the failed response, if there was one.
    status: Option<u16>,
    /// The operation that failed (e.g. "create event").
    context: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteError {
    /// Creates a new error with the given code and message.
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            context: None,
            source: None,
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::InvalidUrl, message)
    }

    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::AuthRequired, message)
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::AuthFailed, message)
    }

    pub fn already_cancelled(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::AlreadyCancelled, message)
    }

    pub fn not_cancelled(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::NotCancelled, message)
    }

    /// Creates an error for a non-success HTTP status.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        let mut err = Self::new(RemoteErrorCode::RemoteError, message);
        err.status = Some(status);
        err
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::Transport, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::InvalidResponse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::Configuration, message)
    }

    /// Sets the operation context for this error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> RemoteErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref context) = self.context {
            write!(f, "{}: ", context)?;
        }
        write!(f, "{}", self.message)
    }
}

impl From<IdentityError> for RemoteError {
    fn from(err: IdentityError) -> Self {
        Self::invalid_url(err.to_string()).with_source(err)
    }
}

/// A specialized Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ridesched_core::{EventIdentity, ResourceKind};

    #[test]
    fn error_code_names() {
        assert_eq!(RemoteErrorCode::AuthRequired.as_str(), "auth_required");
        assert_eq!(RemoteErrorCode::AlreadyCancelled.to_string(), "already_cancelled");
    }

    #[test]
    fn local_codes() {
        assert!(RemoteErrorCode::InvalidUrl.is_local());
        assert!(RemoteErrorCode::AuthRequired.is_local());
        assert!(!RemoteErrorCode::RemoteError.is_local());
        assert!(!RemoteErrorCode::Transport.is_local());
    }

    #[test]
    fn remote_error_carries_status() {
        let err = RemoteError::remote(422, "name can't be blank").with_context("create event");
        assert_eq!(err.code(), RemoteErrorCode::RemoteError);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.context(), Some("create event"));
        assert_eq!(err.to_string(), "create event: name can't be blank");
    }

    #[test]
    fn identity_errors_become_invalid_url() {
        use std::error::Error;
        let identity_err = EventIdentity::parse("https://example.com/routes/1").unwrap_err();
        let err = RemoteError::from(identity_err);
        assert_eq!(err.code(), RemoteErrorCode::InvalidUrl);
        assert!(err.message().contains(&ResourceKind::Event.to_string()));
        assert!(err.source().is_some());
    }
}
