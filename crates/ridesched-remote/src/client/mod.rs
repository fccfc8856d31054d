//! The orchestrating client.
//!
//! [`RemoteClient`] owns the credentials, the session and the transport, and
//! sequences requests through the auth, payload and normalization layers.
//! Every public operation returns an [`OperationResult`]; failures inside a
//! workflow are inspected as [`RemoteResult`]s so later steps (compensation,
//! warnings) can react to them.

mod events;
mod routes;
mod tags;
#[cfg(test)]
pub(crate) mod testing;
mod workflows;

use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::auth::{AuthScheme, Authenticator, Credentials, Session};
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::error_result::error_from_response;
use crate::organizers::OrganizerLookup;
use crate::result::OperationResult;
use crate::strategy::EditStrategy;
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub use routes::{ExpirationOutcome, ImportOptions};
pub use tags::TagAction;

/// Client for the remote ride-planning service.
///
/// One instance holds one session; it is not meant to be shared between
/// threads of control.
pub struct RemoteClient<T> {
    transport: T,
    config: RemoteConfig,
    auth: Authenticator,
    edit_strategy: Box<dyn EditStrategy>,
    organizer_lookup: Option<Box<dyn OrganizerLookup>>,
}

impl<T: Transport> RemoteClient<T> {
    /// Creates a client. The edit strategy comes from `config.edit_strategy`.
    pub fn new(transport: T, credentials: Credentials, config: RemoteConfig) -> Self {
        let auth = Authenticator::new(credentials, config.session_cookie_prefix.clone());
        let edit_strategy = config.edit_strategy.build();
        Self {
            transport,
            config,
            auth,
            edit_strategy,
            organizer_lookup: None,
        }
    }

    /// Replaces the edit strategy.
    pub fn with_edit_strategy(mut self, strategy: Box<dyn EditStrategy>) -> Self {
        self.edit_strategy = strategy;
        self
    }

    /// Uses `lookup` for organizer names instead of the service's search.
    pub fn with_organizer_lookup(mut self, lookup: impl OrganizerLookup + 'static) -> Self {
        self.organizer_lookup = Some(Box::new(lookup));
        self
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        self.auth.session()
    }

    /// Signs in with username and password. Returns true if a session cookie
    /// is now held.
    ///
    /// Never called implicitly by single-resource operations; workflows that
    /// need a session (schedule, update, import) call it themselves.
    pub fn login(&mut self) -> bool {
        match self.try_login() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "login failed");
                false
            }
        }
    }

    pub(crate) fn try_login(&mut self) -> RemoteResult<()> {
        let url = self.sign_in_url();
        let request = self.auth.login_request(&url)?;
        debug!(url = %url, "signing in");
        let response = self
            .transport
            .fetch(&request)
            .map_err(|e| e.with_context("login"))?;
        trace!(status = response.status, "sign-in response");

        if self.auth.complete_login(&response) {
            info!("session established");
            Ok(())
        } else {
            Err(RemoteError::auth_failed(format!(
                "sign-in returned no session cookie (HTTP {})",
                response.status
            ))
            .with_status(response.status)
            .with_context("login"))
        }
    }

    fn sign_in_url(&self) -> String {
        match self.config.organization_id {
            Some(ref org) => self.endpoint(&format!("organizations/{}/sign_in", org)),
            None => self.endpoint("users/sign_in"),
        }
    }

    /// Joins `path` onto the configured base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base(), path.trim_start_matches('/'))
    }

    /// Authorizes and executes a request, returning any response.
    pub(crate) fn send(
        &mut self,
        scheme: AuthScheme,
        request: HttpRequest,
        context: &str,
    ) -> RemoteResult<HttpResponse> {
        let request = self
            .auth
            .authorize(scheme, request)
            .map_err(|e| e.with_context(context))?;
        let response = self
            .transport
            .fetch(&request)
            .map_err(|e| e.with_context(context))?;
        trace!(status = response.status, context, "response received");

        if scheme == AuthScheme::Session {
            self.auth.observe(&response);
        }
        Ok(response)
    }

    /// Like [`send`](Self::send), but any non-2xx status is an error.
    pub(crate) fn send_ok(
        &mut self,
        scheme: AuthScheme,
        request: HttpRequest,
        context: &str,
    ) -> RemoteResult<HttpResponse> {
        let response = self.send(scheme, request, context)?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(&response, context))
        }
    }
}

/// Turns a workflow error into a failed result, naming the operation when the
/// error does not already carry a status-bearing message.
pub(crate) fn fail<R>(err: RemoteError, context: &str) -> OperationResult<R> {
    let err = if err.context().is_none() && err.status().is_none() {
        err.with_context(context)
    } else {
        err
    };
    OperationResult::failure(err)
}

impl<T> fmt::Debug for RemoteClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.config.base())
            .field("session", &self.auth.session().is_established())
            .field("edit_strategy", &self.edit_strategy.name())
            .finish_non_exhaustive()
    }
}
