//! Remote client configuration.

use std::time::Duration;

use chrono::FixedOffset;
use ridesched_core::Organizer;
use url::Url;

use crate::payload::Dialect;
use crate::strategy::EditStrategyConfig;

/// Configuration for the remote client.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the remote service (scheme and host, no trailing path).
    pub base_url: Url,

    /// Organization id used by the sign-in and organizer lookup endpoints.
    pub organization_id: Option<String>,

    /// Name prefix of the session cookie set by the sign-in endpoint.
    pub session_cookie_prefix: String,

    /// Offset applied to split date/times that carry no usable zone.
    pub default_utc_offset: FixedOffset,

    /// Dialect used for single-event get and edit.
    pub event_dialect: Dialect,

    /// How edits are submitted.
    pub edit_strategy: EditStrategyConfig,

    /// Organizer used when organizer resolution yields nothing.
    pub placeholder_organizer: Option<Organizer>,

    /// Request timeout (applied by the HTTP transport).
    pub timeout: Duration,

    /// User agent string (applied by the HTTP transport).
    pub user_agent: String,
}

impl RemoteConfig {
    /// Default base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://ridewithgps.com";

    /// Default session cookie prefix.
    pub const DEFAULT_SESSION_COOKIE_PREFIX: &'static str = "_rwgps_3_session";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url: parsed,
            organization_id: None,
            session_cookie_prefix: Self::DEFAULT_SESSION_COOKIE_PREFIX.to_string(),
            default_utc_offset: ridesched_core::default_utc_offset(),
            event_dialect: Dialect::V1,
            edit_strategy: EditStrategyConfig::default(),
            placeholder_organizer: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("ridesched/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the organization id.
    pub fn with_organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    /// Sets the session cookie prefix.
    pub fn with_session_cookie_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_cookie_prefix = prefix.into();
        self
    }

    /// Sets the default UTC offset.
    pub fn with_default_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.default_utc_offset = offset;
        self
    }

    /// Sets the dialect used for event get/edit.
    pub fn with_event_dialect(mut self, dialect: Dialect) -> Self {
        self.event_dialect = dialect;
        self
    }

    /// Sets the edit strategy.
    pub fn with_edit_strategy(mut self, strategy: EditStrategyConfig) -> Self {
        self.edit_strategy = strategy;
        self
    }

    /// Sets the placeholder organizer.
    pub fn with_placeholder_organizer(mut self, organizer: Organizer) -> Self {
        self.placeholder_organizer = Some(organizer);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base URL without a trailing slash.
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Resolves a possibly relative URL (e.g. `/routes/12`) against the base.
    pub fn absolute_url(&self, url: &str) -> String {
        match self.base_url.join(url) {
            Ok(joined) => joined.to_string(),
            Err(_) => url.to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL).expect("default base URL is valid")
    }
}
