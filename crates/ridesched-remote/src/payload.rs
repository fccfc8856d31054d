//! Request payloads for both API dialects.
//!
//! The legacy (web) dialect takes a flat object with combined timestamps; the
//! versioned (v1) dialect wraps the event in an `event` envelope and splits
//! start/end into date and time fields. Optional fields that are unset are
//! omitted, never sent as null.

use std::fmt;

use ridesched_core::NormalizedEvent;
use ridesched_core::time::{format_timestamp, split};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthScheme;
use crate::error::{RemoteError, RemoteResult};

/// One of the two API surfaces of the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Session-cookie authenticated HTML-application API.
    Web,
    /// Basic-Auth authenticated versioned JSON API.
    #[default]
    V1,
}

impl Dialect {
    /// Returns the auth scheme requests in this dialect use.
    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            Self::Web => AuthScheme::Session,
            Self::V1 => AuthScheme::Basic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::V1 => "v1",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat event body understood by the legacy dialect.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebEventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Numeric visibility code (0 public, 1 private, 2 friends only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<u8>,
    /// `"1"` or `"0"`, as the HTML forms submit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_tokens: Option<Vec<String>>,
    /// Routes as `[{"id": ..}]` objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteIdRef>>,
}

/// A route reference in the legacy dialect's `routes` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteIdRef {
    pub id: String,
}

/// Event body understood by the versioned dialect, before wrapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct V1EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_ids: Option<Vec<String>>,
}

/// A dialect-specific request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Web(WebEventPayload),
    V1 { event: V1EventPayload },
}

impl EventPayload {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Web(_) => Dialect::Web,
            Self::V1 { .. } => Dialect::V1,
        }
    }

    /// Returns the payload as a JSON value.
    pub fn to_value(&self) -> RemoteResult<Value> {
        serde_json::to_value(self).map_err(|e| {
            RemoteError::validation(format!("failed to serialize event payload: {}", e))
                .with_source(e)
        })
    }

    /// Returns the event fields without the dialect envelope.
    pub fn fields(&self) -> RemoteResult<Value> {
        let value = self.to_value()?;
        Ok(match value {
            Value::Object(mut map) if self.dialect() == Dialect::V1 => {
                map.remove("event").unwrap_or(Value::Object(Default::default()))
            }
            other => other,
        })
    }
}

/// Converts a normalized event into the body `dialect` expects.
///
/// An empty name is treated as "leave unchanged" and omitted.
pub fn to_dialect_payload(dialect: Dialect, event: &NormalizedEvent) -> EventPayload {
    match dialect {
        Dialect::Web => EventPayload::Web(to_web(event)),
        Dialect::V1 => EventPayload::V1 {
            event: to_v1(event),
        },
    }
}

fn non_empty_name(event: &NormalizedEvent) -> Option<String> {
    (!event.name.is_empty()).then(|| event.name.clone())
}

fn route_ids(event: &NormalizedEvent) -> Option<Vec<String>> {
    event
        .routes
        .as_ref()
        .map(|routes| routes.iter().map(|r| r.id.clone()).collect())
}

fn to_web(event: &NormalizedEvent) -> WebEventPayload {
    WebEventPayload {
        name: non_empty_name(event),
        desc: event.desc.clone(),
        starts_at: event.starts_at.as_ref().map(format_timestamp),
        ends_at: event.ends_at.as_ref().map(format_timestamp),
        location: event.location.clone(),
        visibility: event.visibility.map(|v| v.code()),
        all_day: event
            .all_day
            .map(|flag| if flag { "1" } else { "0" }.to_string()),
        organizer_tokens: event.organizer_ids.clone(),
        routes: route_ids(event).map(|ids| ids.into_iter().map(|id| RouteIdRef { id }).collect()),
    }
}

fn to_v1(event: &NormalizedEvent) -> V1EventPayload {
    let start = event.starts_at.as_ref().map(split);
    let end = event.ends_at.as_ref().map(split);
    let (start_date, start_time) = start.map(|s| (s.date, s.time)).unzip();
    let (end_date, end_time) = end.map(|s| (s.date, s.time)).unzip();

    V1EventPayload {
        name: non_empty_name(event),
        description: event.desc.clone(),
        location: event.location.clone(),
        start_date,
        start_time,
        end_date,
        end_time,
        time_zone: event.time_zone.clone(),
        all_day: event.all_day,
        visibility: event.visibility.map(|v| v.as_str()),
        organizer_ids: event.organizer_ids.clone(),
        route_ids: route_ids(event),
    }
}
