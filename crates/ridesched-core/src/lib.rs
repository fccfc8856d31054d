//! Core types: resource identities, normalized events, tags, time helpers

pub mod event;
pub mod identity;
pub mod tags;
pub mod time;
pub mod tracing;

pub use event::{CANCELLED_PREFIX, EventState, NormalizedEvent, Organizer, RouteRef, Visibility};
pub use identity::{
    EventIdentity, EventKind, Identity, IdentityError, Kind, ResourceKind, RouteIdentity,
    RouteKind, extract_id, is_resource_url,
};
pub use tags::{Tag, TagError, build_expires_tag, build_expiry_tag, join_tags};
pub use time::{SplitDateTime, default_utc_offset};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
