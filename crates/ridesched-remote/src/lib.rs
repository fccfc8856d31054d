//! Remote ride-planning service client.
//!
//! This crate is the orchestration layer between club automation and the
//! remote service's two API dialects:
//!
//! - [`RemoteClient`] - Public operations (get/edit/create/delete events,
//!   cancel/reinstate, schedule/update workflows, route import, tags)
//! - [`Transport`] - Caller-supplied HTTP execution; [`ReqwestTransport`]
//!   with the `http` feature
//! - [`to_dialect_payload`] / [`from_dialect_response`] - Dialect bridging
//! - [`EditStrategy`] - Single or double PUT submission of edits
//! - [`OperationResult`] - Uniform result envelope
//!
//! # Architecture
//!
//! ```text
//!            RemoteClient operations
//!                     │
//!        ┌────────────┼─────────────┐
//!        ▼            ▼             ▼
//!   Identity     Authenticator   payload / multipart
//!   (core)       (session/basic)        │
//!                     │                 │
//!                     └──────┬──────────┘
//!                            ▼
//!                        Transport
//!                            │
//!                            ▼
//!             normalize / error_result
//!                            │
//!                            ▼
//!                    OperationResult<T>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ridesched_remote::{Credentials, RemoteClient, RemoteConfig, ReqwestTransport};
//!
//! let config = RemoteConfig::default().with_organization_id("47");
//! let transport = ReqwestTransport::new(&config)?;
//! let mut client = RemoteClient::new(transport, credentials, config);
//! let result = client.cancel_event("https://ridewithgps.com/events/188822-sat-a-ride");
//! println!("{}", serde_json::to_string(&result)?);
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod error_result;
#[cfg(feature = "http")]
pub mod http;
pub mod multipart;
pub mod normalize;
pub mod organizers;
pub mod payload;
pub mod result;
pub mod strategy;
pub mod transport;

// Re-export main types at crate root
pub use auth::{AuthScheme, Credentials, Session, basic_auth};
pub use client::{ExpirationOutcome, ImportOptions, RemoteClient, TagAction};
pub use config::RemoteConfig;
pub use error::{RemoteError, RemoteErrorCode, RemoteResult};
pub use error_result::build_error_result;
#[cfg(feature = "http")]
pub use http::ReqwestTransport;
pub use multipart::{Logo, MultipartBody};
pub use normalize::{RouteDetail, from_dialect_response, route_from_response};
pub use organizers::{OrganizerDirectory, OrganizerLookup, Organizers};
pub use payload::{Dialect, EventPayload, RouteIdRef, to_dialect_payload};
pub use result::OperationResult;
pub use strategy::{DoublePut, EditStrategy, EditStrategyConfig, SinglePut};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
