//! Organizer name-to-id resolution.
//!
//! Resolution never fails a workflow: names that cannot be resolved are
//! skipped with a warning, and an empty outcome falls back to the
//! placeholder organizer when one is configured.

use std::collections::HashMap;

use ridesched_core::Organizer;
use serde_json::Value;
use tracing::warn;

use crate::error::RemoteResult;

/// Looks up an organizer by display name.
pub trait OrganizerLookup {
    fn lookup(&self, name: &str) -> RemoteResult<Option<Organizer>>;
}

impl<F> OrganizerLookup for F
where
    F: Fn(&str) -> RemoteResult<Option<Organizer>>,
{
    fn lookup(&self, name: &str) -> RemoteResult<Option<Organizer>> {
        self(name)
    }
}

/// A fixed name-to-organizer table, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct OrganizerDirectory {
    by_name: HashMap<String, Organizer>,
}

impl OrganizerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, organizer: Organizer) {
        self.by_name.insert(organizer.text.trim().to_lowercase(), organizer);
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl FromIterator<Organizer> for OrganizerDirectory {
    fn from_iter<I: IntoIterator<Item = Organizer>>(iter: I) -> Self {
        let mut directory = Self::new();
        for organizer in iter {
            directory.insert(organizer);
        }
        directory
    }
}

impl OrganizerLookup for OrganizerDirectory {
    fn lookup(&self, name: &str) -> RemoteResult<Option<Organizer>> {
        Ok(self.by_name.get(&name.trim().to_lowercase()).cloned())
    }
}

/// Organizers as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Organizers {
    /// Already-resolved ids, used as-is.
    Ids(Vec<String>),
    /// Display names to resolve.
    Names(Vec<String>),
}

impl Organizers {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Ids(v) | Self::Names(v) => v.is_empty(),
        }
    }
}

/// The outcome of resolving [`Organizers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub ids: Vec<String>,
    pub warnings: Vec<String>,
}

/// Resolves organizers to ids with `lookup`.
pub fn resolve_with<F>(organizers: &Organizers, placeholder: Option<&Organizer>, mut lookup: F) -> Resolution
where
    F: FnMut(&str) -> RemoteResult<Option<Organizer>>,
{
    let mut resolution = Resolution::default();
    match organizers {
        Organizers::Ids(ids) => resolution.ids = ids.clone(),
        Organizers::Names(names) => {
            for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
                match lookup(name) {
                    Ok(Some(organizer)) => {
                        if !resolution.ids.contains(&organizer.id) {
                            resolution.ids.push(organizer.id);
                        }
                    }
                    Ok(None) => {
                        warn!(organizer = %name, "organizer not found");
                        resolution.warnings.push(format!("organizer not found: {}", name));
                    }
                    Err(e) => {
                        warn!(organizer = %name, error = %e, "organizer lookup failed");
                        resolution
                            .warnings
                            .push(format!("organizer lookup failed for {}: {}", name, e));
                    }
                }
            }
        }
    }

    if resolution.ids.is_empty()
        && let Some(placeholder) = placeholder
    {
        resolution.ids.push(placeholder.id.clone());
    }
    resolution
}

/// Picks the organizer named `name` out of an organization-users search.
///
/// Body shape: `{"results": [{"id": .., "text": ..}]}`. An exact
/// (case-insensitive) name match wins; a single result is accepted as is.
pub fn parse_search_response(body: &Value, name: &str) -> Option<Organizer> {
    let results: Vec<Organizer> = body
        .get("results")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|item| {
            let id = match item.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let text = item.get("text").and_then(Value::as_str).unwrap_or_default();
            Some(Organizer::new(id, text))
        })
        .collect();

    let wanted = name.trim();
    if let Some(exact) = results.iter().find(|o| o.text.trim().eq_ignore_ascii_case(wanted)) {
        return Some(exact.clone());
    }
    match results.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}
