//! Multi-step event workflows: schedule (login, create, edit, with delete as
//! compensation) and update (login, edit).

use ridesched_core::{EventIdentity, NormalizedEvent, Organizer};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::AuthScheme;
use crate::error::{RemoteError, RemoteResult};
use crate::multipart::Logo;
use crate::organizers::{Organizers, Resolution, parse_search_response, resolve_with};
use crate::result::OperationResult;
use crate::transport::{HttpRequest, Transport};

use super::{RemoteClient, fail};

impl<T: Transport> RemoteClient<T> {
    /// Creates a fully configured event.
    ///
    /// Signs in, creates the event (with the logo if given), then edits it
    /// with the full fields and resolved organizers. If that edit fails the
    /// new event is deleted before the failure is returned.
    pub fn schedule_event(
        &mut self,
        fields: &NormalizedEvent,
        organizers: &Organizers,
        logo: Option<&Logo>,
    ) -> OperationResult<NormalizedEvent> {
        if fields.name.trim().is_empty() {
            return fail(RemoteError::validation("event name is required"), "schedule event");
        }
        if let Err(e) = self.try_login() {
            return fail(e, "schedule event");
        }

        let Resolution { ids, warnings } = self.resolve_organizers(organizers);

        let created = match self.create(fields, logo) {
            Ok(created) => created,
            Err(e) => return fail(e, "schedule event"),
        };
        let Some(id) = created.id.as_deref().and_then(EventIdentity::from_numeric) else {
            return fail(
                RemoteError::invalid_response("created event has a non-numeric id"),
                "schedule event",
            );
        };

        let mut full = fields.clone();
        if !ids.is_empty() {
            full.organizer_ids = Some(ids);
        }

        match self.apply_edit(&id, &full) {
            Ok(event) => {
                info!(event = %id, "event scheduled");
                let url = event.url.clone().or(created.url);
                let result = warnings
                    .into_iter()
                    .fold(OperationResult::ok(event), |r, w| r.with_warning(w));
                match url {
                    Some(url) => result.with_event_url(url),
                    None => result,
                }
            }
            Err(edit_err) => {
                warn!(event = %id, error = %edit_err, "configuring new event failed, deleting it");
                let err = match self.delete(&id) {
                    Ok(()) => edit_err,
                    Err(delete_err) => {
                        warn!(event = %id, error = %delete_err, "compensating delete failed");
                        compound(edit_err, &delete_err)
                    }
                };
                fail(err, "schedule event")
            }
        }
    }

    /// Edits an event after signing in, merging in resolved organizers.
    pub fn update_event(
        &mut self,
        url: &str,
        fields: &NormalizedEvent,
        organizers: Option<&Organizers>,
    ) -> OperationResult<NormalizedEvent> {
        let id = match EventIdentity::parse(url) {
            Ok(id) => id,
            Err(e) => return fail(e.into(), "update event"),
        };
        if let Err(e) = self.try_login() {
            return fail(e, "update event");
        }

        let mut full = fields.clone();
        let mut warnings = Vec::new();
        if let Some(organizers) = organizers.filter(|o| !o.is_empty()) {
            let resolution = self.resolve_organizers(organizers);
            warnings = resolution.warnings;
            if !resolution.ids.is_empty() {
                full.organizer_ids = Some(resolution.ids);
            }
        }

        let result = self.apply_edit(&id, &full);
        warnings
            .into_iter()
            .fold(self.event_result(result, "update event"), |r, w| r.with_warning(w))
    }

    /// Resolves organizers, never failing.
    pub(crate) fn resolve_organizers(&mut self, organizers: &Organizers) -> Resolution {
        let placeholder = self.config.placeholder_organizer.clone();
        resolve_with(organizers, placeholder.as_ref(), |name| self.lookup_organizer(name))
    }

    /// Looks an organizer up by name, through the injected lookup if any,
    /// otherwise through the organization-users search (session scheme).
    pub(crate) fn lookup_organizer(&mut self, name: &str) -> RemoteResult<Option<Organizer>> {
        if let Some(ref lookup) = self.organizer_lookup {
            return lookup.lookup(name);
        }

        let org = self.config.organization_id.clone().ok_or_else(|| {
            RemoteError::configuration("organization id is required for organizer lookup")
        })?;
        let request = HttpRequest::post(
            self.endpoint(&format!("organizations/{}/organization_users.json", org)),
        )
        .json(&json!({"search": {"keywords": name}, "page": 1}))?;
        let response = self.send_ok(AuthScheme::Session, request, "organizer lookup")?;
        Ok(parse_search_response(&response.json()?, name))
    }
}

/// Folds a failed compensation into the original error.
fn compound(primary: RemoteError, compensation: &RemoteError) -> RemoteError {
    let mut err = RemoteError::new(
        primary.code(),
        format!("{}; compensating delete also failed: {}", primary, compensation),
    );
    if let Some(status) = primary.status() {
        err = err.with_status(status);
    }
    err.with_source(primary)
}
