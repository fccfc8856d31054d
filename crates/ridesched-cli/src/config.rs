//! CLI configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/ridesched/config.toml`:
//!
//! ```toml
//! [service]
//! base_url = "https://ridewithgps.com"
//! organization_id = "47"
//! default_utc_offset = "-08:00"
//! event_dialect = "v1"
//!
//! [credentials]
//! api_key = "env::RIDESCHED_API_KEY"
//! auth_token = "pass::club/ridesched/token"
//! username = "rides@example.org"
//! password = "pass::club/ridesched/password"
//!
//! [edit]
//! strategy = "double"
//!
//! [expiry]
//! days = 14
//!
//! [organizers]
//! "Jane Rider" = "302732"
//! ```
//!
//! Credential values support secret references (see [`crate::secret`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use ridesched_core::Organizer;
use ridesched_core::time::parse_offset;
use ridesched_remote::{Credentials, Dialect, EditStrategyConfig, OrganizerDirectory, RemoteConfig};
use serde::{Deserialize, Serialize};

use crate::secret;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the `ridesched` CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging.
    pub debug: bool,

    /// Remote service settings.
    pub service: ServiceSettings,

    /// Credentials (secret references allowed).
    pub credentials: CredentialSettings,

    /// How edits are submitted.
    pub edit: EditStrategyConfig,

    /// Expiry tag settings.
    pub expiry: ExpirySettings,

    /// Organizer names mapped to ids, consulted before the service search.
    pub organizers: BTreeMap<String, String>,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub base_url: String,
    pub organization_id: Option<String>,
    pub session_cookie_prefix: String,
    /// Offset such as `-08:00`, used when a response carries no usable zone.
    pub default_utc_offset: String,
    pub event_dialect: Dialect,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Organizer id used when no organizer resolves.
    pub placeholder_organizer_id: Option<String>,
    pub placeholder_organizer_name: Option<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: RemoteConfig::DEFAULT_BASE_URL.to_string(),
            organization_id: None,
            session_cookie_prefix: RemoteConfig::DEFAULT_SESSION_COOKIE_PREFIX.to_string(),
            default_utc_offset: "-08:00".to_string(),
            event_dialect: Dialect::default(),
            timeout: RemoteConfig::DEFAULT_TIMEOUT_SECS,
            placeholder_organizer_id: None,
            placeholder_organizer_name: None,
        }
    }
}

/// Credential references. Unset values resolve to empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Expiry tag settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirySettings {
    /// Days after the ride date an `EXP:` tag points at.
    pub days: i64,
}

impl Default for ExpirySettings {
    fn default() -> Self {
        Self { days: 14 }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it is absent.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ridesched")
    }

    /// Builds the remote client configuration.
    pub fn to_remote_config(&self) -> Result<RemoteConfig, String> {
        let service = &self.service;
        let mut config = RemoteConfig::new(&service.base_url)
            .map_err(|e| format!("invalid base_url {:?}: {}", service.base_url, e))?
            .with_session_cookie_prefix(&service.session_cookie_prefix)
            .with_default_utc_offset(self.default_offset()?)
            .with_event_dialect(service.event_dialect)
            .with_edit_strategy(self.edit.clone())
            .with_timeout(Duration::from_secs(service.timeout));

        if let Some(ref org) = service.organization_id {
            config = config.with_organization_id(org);
        }
        if let Some(ref id) = service.placeholder_organizer_id {
            let name = service.placeholder_organizer_name.clone().unwrap_or_default();
            config = config.with_placeholder_organizer(Organizer::new(id, name));
        }
        Ok(config)
    }

    /// Parses `service.default_utc_offset`.
    pub fn default_offset(&self) -> Result<FixedOffset, String> {
        parse_offset(&self.service.default_utc_offset).ok_or_else(|| {
            format!(
                "default_utc_offset must be a numeric offset such as -08:00, got {:?}",
                self.service.default_utc_offset
            )
        })
    }

    /// Resolves the `[credentials]` section, expanding secret references.
    pub fn resolve_credentials(&self) -> Result<Credentials, String> {
        let creds = &self.credentials;
        let field = |name: &str, value: &Option<String>| -> Result<String, String> {
            match value {
                Some(raw) => {
                    secret::resolve(raw).map_err(|e| format!("failed to resolve {}: {}", name, e))
                }
                None => Ok(String::new()),
            }
        };

        Ok(Credentials::new(
            field("api_key", &creds.api_key)?,
            field("auth_token", &creds.auth_token)?,
            field("username", &creds.username)?,
            field("password", &creds.password)?,
        ))
    }

    /// Builds the local organizer directory from `[organizers]`.
    pub fn organizer_directory(&self) -> OrganizerDirectory {
        self.organizers
            .iter()
            .map(|(name, id)| Organizer::new(id, name))
            .collect()
    }
}
