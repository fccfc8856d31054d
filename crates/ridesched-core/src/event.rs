//! Event types shared by both API dialects.
//!
//! - [`NormalizedEvent`]: the single dialect-independent event representation
//! - [`Visibility`]: the numeric visibility enum and its dialect spellings
//! - [`Organizer`] / [`RouteRef`]: references carried on events
//! - [`EventState`]: the cancelled/active state encoded in the event name

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Name prefix that marks an event as cancelled.
pub const CANCELLED_PREFIX: &str = "CANCELLED: ";

/// Who can see an event.
///
/// The legacy dialect uses the numeric codes, the versioned dialect the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    FriendsOnly,
}

impl Visibility {
    /// Maps a numeric code (0/1/2) to a visibility.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Public),
            1 => Some(Self::Private),
            2 => Some(Self::FriendsOnly),
            _ => None,
        }
    }

    /// Maps a versioned-dialect name to a visibility.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "friends_only" | "friends" => Some(Self::FriendsOnly),
            other => other.parse().ok().and_then(Self::from_code),
        }
    }

    /// Returns the numeric code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Private => 1,
            Self::FriendsOnly => 2,
        }
    }

    /// Returns the versioned-dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::FriendsOnly => "friends_only",
        }
    }
}

/// An event organizer as returned by either dialect.
///
/// The versioned dialect names the display field `name`, the legacy one
/// `text`; both deserialize into `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub id: String,
    #[serde(alias = "name")]
    pub text: String,
}

impl Organizer {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A route attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RouteRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// The canonical event shape used by every caller, whichever dialect read or
/// will write it.
///
/// Optional fields left as `None` are omitted from request payloads rather
/// than sent as nulls. The description serializes under both `desc` and
/// `description`; either key is accepted on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventRepr", into = "EventRepr")]
pub struct NormalizedEvent {
    /// Numeric id, absent before creation.
    pub id: Option<String>,
    pub name: String,
    pub desc: Option<String>,
    pub starts_at: Option<DateTime<FixedOffset>>,
    pub ends_at: Option<DateTime<FixedOffset>>,
    /// Named zone to send alongside split times, when known.
    pub time_zone: Option<String>,
    pub location: Option<String>,
    pub visibility: Option<Visibility>,
    pub all_day: Option<bool>,
    pub organizer_ids: Option<Vec<String>>,
    /// Organizers with display names, populated on read.
    pub organizers: Vec<Organizer>,
    pub routes: Option<Vec<RouteRef>>,
    /// Canonical URL, populated on read.
    pub url: Option<String>,
}

/// Wire form of [`NormalizedEvent`].
#[derive(Serialize, Deserialize)]
struct EventRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    starts_at: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ends_at: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    organizer_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    organizers: Vec<Organizer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    routes: Option<Vec<RouteRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl From<EventRepr> for NormalizedEvent {
    fn from(repr: EventRepr) -> Self {
        Self {
            id: repr.id,
            name: repr.name,
            desc: repr.desc.or(repr.description),
            starts_at: repr.starts_at,
            ends_at: repr.ends_at,
            time_zone: repr.time_zone,
            location: repr.location,
            visibility: repr.visibility,
            all_day: repr.all_day,
            organizer_ids: repr.organizer_ids,
            organizers: repr.organizers,
            routes: repr.routes,
            url: repr.url,
        }
    }
}

impl From<NormalizedEvent> for EventRepr {
    fn from(event: NormalizedEvent) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.desc.clone(),
            desc: event.desc,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            time_zone: event.time_zone,
            location: event.location,
            visibility: event.visibility,
            all_day: event.all_day,
            organizer_ids: event.organizer_ids,
            organizers: event.organizers,
            routes: event.routes,
            url: event.url,
        }
    }
}

impl NormalizedEvent {
    /// Creates an event with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Builder method to set the start.
    pub fn with_starts_at(mut self, starts_at: DateTime<FixedOffset>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Builder method to set the end.
    pub fn with_ends_at(mut self, ends_at: DateTime<FixedOffset>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Builder method to set the all-day flag.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    /// Builder method to set organizer ids.
    pub fn with_organizer_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.organizer_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set attached routes.
    pub fn with_routes(mut self, routes: Vec<RouteRef>) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Returns the description under its versioned-dialect name.
    pub fn description(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Returns the cancellation state derived from the name.
    pub fn state(&self) -> EventState {
        EventState::of(&self.name)
    }
}

/// Whether an event is active or cancelled.
///
/// The name field is the only storage for this state: a cancelled event's
/// name starts with [`CANCELLED_PREFIX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Active,
    Cancelled,
}

impl EventState {
    /// Derives the state from an event name.
    pub fn of(name: &str) -> Self {
        if name.starts_with(CANCELLED_PREFIX) {
            Self::Cancelled
        } else {
            Self::Active
        }
    }

    /// Returns the name an active event gets when cancelled, or `None` if the
    /// name is already cancelled.
    pub fn cancelled_name(name: &str) -> Option<String> {
        match Self::of(name) {
            Self::Active => Some(format!("{CANCELLED_PREFIX}{name}")),
            Self::Cancelled => None,
        }
    }

    /// Returns the name a cancelled event gets when reinstated, or `None` if
    /// the name is not cancelled.
    pub fn reinstated_name(name: &str) -> Option<String> {
        name.strip_prefix(CANCELLED_PREFIX).map(str::to_string)
    }
}
