//! Resource identities derived from remote-service URLs.
//!
//! Every event and route on the remote service is addressed by a URL of the
//! form `https://<host>/events/<id>[-slug]` or `https://<host>/routes/<id>[-slug]`.
//! This module extracts the numeric identifier from such URLs and rebuilds
//! canonical URLs from identifiers.
//!
//! The two resource kinds are kept apart at the type level: an
//! [`EventIdentity`] can only be produced from an event URL and a
//! [`RouteIdentity`] only from a route URL.

use std::fmt;
use std::marker::PhantomData;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of resource addressed by a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Event,
    Route,
}

impl ResourceKind {
    /// Returns the path segment used by the remote service for this kind.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Event => "events",
            Self::Route => "routes",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Event => &EVENT_URL,
            Self::Route => &ROUTE_URL,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Route => write!(f, "route"),
        }
    }
}

fn resource_pattern(segment: &str) -> Regex {
    // The id must end the string or be followed by a slug, a sub-path
    // (`/edit`), a query or a fragment.
    Regex::new(&format!(r"^https://[^/\s?#]+/{segment}/(\d+)(?:$|[-/?#])"))
        .expect("static resource pattern")
}

static EVENT_URL: LazyLock<Regex> = LazyLock::new(|| resource_pattern("events"));
static ROUTE_URL: LazyLock<Regex> = LazyLock::new(|| resource_pattern("routes"));

/// Error returned when a URL does not identify a resource of the expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("invalid {kind} URL: {url:?}")]
    InvalidUrl { kind: ResourceKind, url: String },
}

/// Extracts the numeric id from a resource URL.
///
/// Returns `None` when the URL is empty, points at another kind of resource,
/// or carries a non-numeric id. Use [`parse`] where absence is an error.
pub fn extract_id(kind: ResourceKind, url: &str) -> Option<String> {
    kind.pattern()
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Returns true if `url` looks like a URL for a resource of `kind`.
pub fn is_resource_url(kind: ResourceKind, url: &str) -> bool {
    extract_id(kind, url).is_some()
}

/// Parses a URL into an identity of the given marker kind.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidUrl`] exactly when [`extract_id`] would
/// return `None`.
pub fn parse<K: Kind>(url: &str) -> Result<Identity<K>, IdentityError> {
    extract_id(K::KIND, url)
        .map(Identity::from_id)
        .ok_or_else(|| IdentityError::InvalidUrl {
            kind: K::KIND,
            url: url.to_string(),
        })
}

/// Type-level marker for a resource kind.
pub trait Kind: fmt::Debug + Clone + Copy + PartialEq + Eq + Send + Sync + 'static {
    const KIND: ResourceKind;
}

/// Marker for event identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind;

impl Kind for EventKind {
    const KIND: ResourceKind = ResourceKind::Event;
}

/// Marker for route identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKind;

impl Kind for RouteKind {
    const KIND: ResourceKind = ResourceKind::Route;
}

/// A validated resource identity.
///
/// Only constructible from a URL that matched the kind's exact path prefix,
/// or from a numeric id already known to belong to that kind.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity<K: Kind> {
    id: String,
    kind: PhantomData<K>,
}

/// Identity of an event.
pub type EventIdentity = Identity<EventKind>;

/// Identity of a route.
pub type RouteIdentity = Identity<RouteKind>;

impl<K: Kind> Identity<K> {
    fn from_id(id: String) -> Self {
        Self {
            id,
            kind: PhantomData,
        }
    }

    /// Parses a resource URL. See [`parse`].
    pub fn parse(url: &str) -> Result<Self, IdentityError> {
        parse(url)
    }

    /// Builds an identity from a bare numeric id.
    ///
    /// Returns `None` for empty or non-numeric input.
    pub fn from_numeric(id: impl AsRef<str>) -> Option<Self> {
        let id = id.as_ref().trim();
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self::from_id(id.to_string()))
        } else {
            None
        }
    }

    /// Returns the numeric id as a string.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the resource kind.
    pub fn kind(&self) -> ResourceKind {
        K::KIND
    }

    /// Rebuilds the canonical URL for this resource under `base_url`.
    ///
    /// ```
    /// use ridesched_core::EventIdentity;
    ///
    /// let id = EventIdentity::parse("https://example.com/events/42-sunday-ride").unwrap();
    /// assert_eq!(id.canonical_url("https://example.com/"), "https://example.com/events/42");
    /// ```
    pub fn canonical_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            K::KIND.segment(),
            self.id
        )
    }
}

impl<K: Kind> fmt::Debug for Identity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match K::KIND {
            ResourceKind::Event => "EventIdentity",
            ResourceKind::Route => "RouteIdentity",
        };
        f.debug_tuple(name).field(&self.id).finish()
    }
}

impl<K: Kind> fmt::Display for Identity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", K::KIND.segment(), self.id)
    }
}
