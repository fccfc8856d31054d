//! Response bodies to normalized values.
//!
//! Both dialects are read by the same tolerant pipeline:
//!
//! 1. Unwrap an `{event: {...}}` / `{route: {...}}` envelope if present
//! 2. Read each concept from whichever dialect's field carries it
//! 3. Combine split date/time fields into single timestamps
//!
//! Callers only ever see [`NormalizedEvent`] and [`RouteDetail`].

use chrono::{DateTime, FixedOffset};
use ridesched_core::time::{combine, parse_timestamp};
use ridesched_core::{NormalizedEvent, Organizer, RouteRef, Visibility};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{RemoteError, RemoteResult};
use crate::payload::Dialect;

/// Converts an event response body from either dialect.
///
/// `default_offset` applies when split date/times come without a usable zone.
///
/// # Errors
///
/// Returns `InvalidResponse` if the body (after unwrapping) is not an object.
pub fn from_dialect_response(
    dialect: Dialect,
    body: &Value,
    default_offset: FixedOffset,
) -> RemoteResult<NormalizedEvent> {
    let obj = unwrap_envelope(body, "event").ok_or_else(|| {
        RemoteError::invalid_response(format!("{} event response is not an object", dialect))
    })?;

    let time_zone = str_field(obj, &["time_zone"]);
    let zone = time_zone.as_deref();
    let starts_at = timestamp(obj, ["starts_at", "start_date", "start_time"], zone, default_offset);
    let ends_at = timestamp(obj, ["ends_at", "end_date", "end_time"], zone, default_offset);

    let organizers = organizers(obj);
    let organizer_ids = id_list(obj, &["organizer_ids", "organizer_tokens"]).or_else(|| {
        (!organizers.is_empty()).then(|| organizers.iter().map(|o| o.id.clone()).collect())
    });

    Ok(NormalizedEvent {
        id: obj.get("id").and_then(id_value),
        name: str_field(obj, &["name"]).unwrap_or_default(),
        desc: str_field(obj, &["desc", "description"]),
        starts_at,
        ends_at,
        time_zone,
        location: str_field(obj, &["location"]),
        visibility: obj.get("visibility").and_then(visibility),
        all_day: obj.get("all_day").and_then(flag),
        organizer_ids,
        organizers,
        routes: routes(obj),
        url: str_field(obj, &["html_url", "url"]),
    })
}

/// A route as returned by the versioned dialect's route fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDetail {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The unwrapped response object, for fields not modelled here.
    #[serde(skip)]
    pub raw: Value,
}

impl RouteDetail {
    /// Returns true if the route carries `tag` (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Converts a route response body.
///
/// Tags are read from `tag_names` (array or comma-separated string) or from
/// `tags` (strings or `{name}` objects).
pub fn route_from_response(body: &Value) -> RemoteResult<RouteDetail> {
    let obj = unwrap_envelope(body, "route")
        .ok_or_else(|| RemoteError::invalid_response("route response is not an object"))?;
    let id = obj
        .get("id")
        .and_then(id_value)
        .ok_or_else(|| RemoteError::invalid_response("route response has no id"))?;

    Ok(RouteDetail {
        id,
        name: str_field(obj, &["name"]),
        url: str_field(obj, &["html_url", "url"]),
        tags: route_tags(obj),
        user_id: obj.get("user_id").and_then(id_value),
        raw: Value::Object(obj.clone()),
    })
}

fn unwrap_envelope<'a>(body: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    let obj = body.as_object()?;
    match obj.get(key) {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(obj),
    }
}

fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads `[combined, date, time]` keys: the combined timestamp wins.
fn timestamp(
    obj: &Map<String, Value>,
    [combined, date_key, time_key]: [&str; 3],
    zone: Option<&str>,
    default_offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    if let Some(dt) = obj.get(combined).and_then(Value::as_str).and_then(parse_timestamp) {
        return Some(dt);
    }
    let date = obj.get(date_key).and_then(Value::as_str)?;
    let time = obj.get(time_key).and_then(Value::as_str);
    combine(date, time, zone, default_offset)
}

fn visibility(value: &Value) -> Option<Visibility> {
    match value {
        Value::Number(n) => n.as_u64().and_then(Visibility::from_code),
        Value::String(s) => Visibility::from_name(s),
        _ => None,
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn organizers(obj: &Map<String, Value>) -> Vec<Organizer> {
    let Some(items) = obj.get("organizers").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(id_value)?;
            let text = item
                .get("text")
                .or_else(|| item.get("name"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(Organizer::new(id, text))
        })
        .collect()
}

fn id_list(obj: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(Value::as_array)
        .map(|items| items.iter().filter_map(id_value).collect())
}

fn routes(obj: &Map<String, Value>) -> Option<Vec<RouteRef>> {
    if let Some(items) = obj.get("routes").and_then(Value::as_array) {
        return Some(
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id").and_then(id_value).or_else(|| id_value(item))?;
                    Some(RouteRef {
                        id,
                        name: item.get("name").and_then(Value::as_str).map(str::to_string),
                    })
                })
                .collect(),
        );
    }
    id_list(obj, &["route_ids"]).map(|ids| ids.into_iter().map(RouteRef::new).collect())
}

fn route_tags(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("tag_names").or_else(|| obj.get("tags")) {
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
