//! Edit strategies.
//!
//! Some versions of the remote service ignore part of a single edit PUT: only
//! the name and the start date/time reliably apply. Submitting the edit twice,
//! first with `all_day` forced on, makes the rest stick. Whether that is still
//! needed, and for which fields, is a matter of configuration.

use ridesched_core::NormalizedEvent;
use serde::{Deserialize, Serialize};

/// The writable event fields, in versioned-dialect naming.
pub const WRITABLE_EVENT_FIELDS: [&str; 12] = [
    "name",
    "description",
    "location",
    "start_date",
    "start_time",
    "end_date",
    "end_time",
    "time_zone",
    "all_day",
    "visibility",
    "organizer_ids",
    "route_ids",
];

/// Fields that a single PUT does not reliably apply.
pub fn default_affected_fields() -> Vec<String> {
    WRITABLE_EVENT_FIELDS
        .iter()
        .filter(|f| !matches!(**f, "name" | "start_date" | "start_time"))
        .map(|f| f.to_string())
        .collect()
}

/// Returns the writable fields an edit carries.
pub fn touched_fields(fields: &NormalizedEvent) -> Vec<&'static str> {
    let mut touched = Vec::new();
    if !fields.name.is_empty() {
        touched.push("name");
    }
    if fields.desc.is_some() {
        touched.push("description");
    }
    if fields.location.is_some() {
        touched.push("location");
    }
    if fields.starts_at.is_some() {
        touched.extend(["start_date", "start_time"]);
    }
    if fields.ends_at.is_some() {
        touched.extend(["end_date", "end_time"]);
    }
    if fields.time_zone.is_some() {
        touched.push("time_zone");
    }
    if fields.all_day.is_some() {
        touched.push("all_day");
    }
    if fields.visibility.is_some() {
        touched.push("visibility");
    }
    if fields.organizer_ids.is_some() {
        touched.push("organizer_ids");
    }
    if fields.routes.is_some() {
        touched.push("route_ids");
    }
    touched
}

/// Decides the sequence of PUT bodies an edit is submitted as.
///
/// The client submits the passes in order and stops at the first failure; the
/// outcome of the edit is the outcome of the last pass submitted.
pub trait EditStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the field sets to PUT, in order. Never empty.
    fn passes(&self, fields: &NormalizedEvent) -> Vec<NormalizedEvent>;
}

/// One PUT carrying every supplied field.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePut;

impl EditStrategy for SinglePut {
    fn name(&self) -> &'static str {
        "single"
    }

    fn passes(&self, fields: &NormalizedEvent) -> Vec<NormalizedEvent> {
        vec![fields.clone()]
    }
}

/// A priming PUT with `all_day` forced on, then the real PUT.
///
/// Priming only happens when the edit touches one of `affected_fields`.
#[derive(Debug, Clone)]
pub struct DoublePut {
    affected_fields: Vec<String>,
}

impl DoublePut {
    pub fn new(affected_fields: Vec<String>) -> Self {
        Self { affected_fields }
    }

    pub fn affected_fields(&self) -> &[String] {
        &self.affected_fields
    }

    fn needs_priming(&self, fields: &NormalizedEvent) -> bool {
        touched_fields(fields)
            .iter()
            .any(|f| self.affected_fields.iter().any(|a| a == f))
    }
}

impl Default for DoublePut {
    fn default() -> Self {
        Self::new(default_affected_fields())
    }
}

impl EditStrategy for DoublePut {
    fn name(&self) -> &'static str {
        "double"
    }

    fn passes(&self, fields: &NormalizedEvent) -> Vec<NormalizedEvent> {
        if !self.needs_priming(fields) {
            return vec![fields.clone()];
        }

        let mut primed = fields.clone();
        primed.all_day = Some(true);

        // The priming pass leaves all_day on; the real pass must clear it.
        let mut real = fields.clone();
        real.all_day = Some(fields.all_day.unwrap_or(false));

        vec![primed, real]
    }
}

/// Serializable selection of an [`EditStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EditStrategyConfig {
    Single,
    Double {
        #[serde(default = "default_affected_fields")]
        affected_fields: Vec<String>,
    },
}

impl EditStrategyConfig {
    /// Builds the strategy this configuration selects.
    pub fn build(&self) -> Box<dyn EditStrategy> {
        match self {
            Self::Single => Box::new(SinglePut),
            Self::Double { affected_fields } => Box::new(DoublePut::new(affected_fields.clone())),
        }
    }
}

impl Default for EditStrategyConfig {
    fn default() -> Self {
        Self::Double {
            affected_fields: default_affected_fields(),
        }
    }
}
