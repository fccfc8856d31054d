//! Tags attached to events and routes.
//!
//! Tags are free-form labels, but two structured forms are recognised:
//!
//! - expiry tags, `EXP:YYYY-MM-DD`, computed from a ride date plus an offset
//! - route expiration tags, `expires: MM/DD/YYYY`, used to guard against
//!   shortening an existing expiry window

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of computed expiry tags.
pub const EXPIRY_TAG_PREFIX: &str = "EXP:";

/// Prefix of route expiration tags.
pub const EXPIRES_TAG_PREFIX: &str = "expires:";

/// Error returned for tags that cannot be sent in a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("tag is empty")]
    Empty,
    #[error("tag {0:?} contains a comma")]
    Comma(String),
    #[error("{date} plus {days} days is out of range")]
    ExpiryOutOfRange { date: NaiveDate, days: i64 },
}

/// A single tag.
///
/// Batch updates join tag names with commas, so a tag may not contain one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Creates a tag, trimming surrounding whitespace.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TagError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(TagError::Empty);
        }
        if value.contains(',') {
            return Err(TagError::Comma(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Tag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::new(value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

/// Joins tags into the comma-separated list used by batch updates.
pub fn join_tags(tags: &[Tag]) -> String {
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(",")
}

/// Builds the expiry tag for a ride on `ride_date` that expires
/// `offset_days` later.
///
/// ```
/// use chrono::NaiveDate;
/// use ridesched_core::tags::build_expiry_tag;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 25).unwrap();
/// assert_eq!(build_expiry_tag(date, 14).unwrap().as_str(), "EXP:2025-02-08");
/// ```
///
/// # Errors
///
/// Returns [`TagError::ExpiryOutOfRange`] if the expiry date is not
/// representable.
pub fn build_expiry_tag(ride_date: NaiveDate, offset_days: i64) -> Result<Tag, TagError> {
    let expiry = Duration::try_days(offset_days)
        .and_then(|offset| ride_date.checked_add_signed(offset))
        .ok_or(TagError::ExpiryOutOfRange {
            date: ride_date,
            days: offset_days,
        })?;
    Ok(Tag(format!("{EXPIRY_TAG_PREFIX}{}", expiry.format("%Y-%m-%d"))))
}

/// Parses an `EXP:YYYY-MM-DD` tag.
pub fn parse_expiry_tag(tag: &str) -> Option<NaiveDate> {
    let date = tag.trim().strip_prefix(EXPIRY_TAG_PREFIX)?;
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Builds an `expires: MM/DD/YYYY` route expiration tag.
pub fn build_expires_tag(date: NaiveDate) -> Tag {
    Tag(format!("{EXPIRES_TAG_PREFIX} {}", date.format("%m/%d/%Y")))
}

/// Parses a route expiration tag. The prefix is matched case-insensitively.
pub fn parse_expires_tag(tag: &str) -> Option<NaiveDate> {
    let tag = tag.trim();
    let head = tag.get(..EXPIRES_TAG_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(EXPIRES_TAG_PREFIX) {
        return None;
    }
    crate::time::parse_date(&tag[EXPIRES_TAG_PREFIX.len()..])
}

/// Finds the first route expiration tag among `tags`.
pub fn find_expires_tag<'a, I>(tags: I) -> Option<(&'a str, NaiveDate)>
where
    I: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .find_map(|t| parse_expires_tag(t).map(|d| (t, d)))
}
