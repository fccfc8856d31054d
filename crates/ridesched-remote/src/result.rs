//! The uniform result envelope returned by every public operation.

use serde::Serialize;

use crate::error::{RemoteError, RemoteErrorCode, RemoteResult};

/// Outcome of a public operation.
///
/// Exactly one of the error or the success payload is populated. Secondary
/// effects that failed after the primary one succeeded are reported as
/// warnings on a successful result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    warnings: Vec<String>,
    #[serde(skip)]
    code: Option<RemoteErrorCode>,
}

impl<T> OperationResult<T> {
    /// A successful result carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            event_url: None,
            route_url: None,
            error: None,
            warnings: Vec::new(),
            code: None,
        }
    }

    /// A failed result carrying `error`'s message and code.
    pub fn failure(error: RemoteError) -> Self {
        Self {
            success: false,
            data: None,
            event_url: None,
            route_url: None,
            error: Some(error.to_string()),
            warnings: Vec::new(),
            code: Some(error.code()),
        }
    }

    pub fn from_result(result: RemoteResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(err),
        }
    }

    /// Attaches the event URL. Ignored on failed results.
    pub fn with_event_url(mut self, url: impl Into<String>) -> Self {
        if self.success {
            self.event_url = Some(url.into());
        }
        self
    }

    /// Attaches the route URL. Ignored on failed results.
    pub fn with_route_url(mut self, url: impl Into<String>) -> Self {
        if self.success {
            self.route_url = Some(url.into());
        }
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn event_url(&self) -> Option<&str> {
        self.event_url.as_deref()
    }

    pub fn route_url(&self) -> Option<&str> {
        self.route_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns the error category of a failed result.
    pub fn code(&self) -> Option<RemoteErrorCode> {
        self.code
    }

    /// Converts the payload, keeping URLs, error and warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            event_url: self.event_url,
            route_url: self.route_url,
            error: self.error,
            warnings: self.warnings,
            code: self.code,
        }
    }
}
