//! Single-event operations: get, edit, create, delete, cancel, reinstate and
//! template copy.

use ridesched_core::{EventIdentity, EventState, NormalizedEvent};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::AuthScheme;
use crate::error::{RemoteError, RemoteResult};
use crate::error_result::error_from_response;
use crate::multipart::{Logo, MultipartBody};
use crate::normalize::from_dialect_response;
use crate::payload::{Dialect, to_dialect_payload};
use crate::result::OperationResult;
use crate::strategy::touched_fields;
use crate::transport::{HttpRequest, Transport};

use super::{RemoteClient, fail};

impl<T: Transport> RemoteClient<T> {
    /// Fetches an event.
    pub fn get_event(&mut self, url: &str) -> OperationResult<NormalizedEvent> {
        let result = EventIdentity::parse(url)
            .map_err(RemoteError::from)
            .and_then(|id| self.fetch_event(&id));
        self.event_result(result, "get event")
    }

    /// Edits an event with the supplied fields, through the edit strategy.
    pub fn edit_event(&mut self, url: &str, fields: &NormalizedEvent) -> OperationResult<NormalizedEvent> {
        let result = EventIdentity::parse(url)
            .map_err(RemoteError::from)
            .and_then(|id| self.apply_edit(&id, fields));
        self.event_result(result, "edit event")
    }

    /// Creates an event, as multipart when a logo is attached.
    pub fn create_event(
        &mut self,
        fields: &NormalizedEvent,
        logo: Option<&Logo>,
    ) -> OperationResult<NormalizedEvent> {
        let result = self.create(fields, logo);
        self.event_result(result, "create event")
    }

    /// Deletes an event. Only `204 No Content` counts as success.
    pub fn delete_event(&mut self, url: &str) -> OperationResult<()> {
        let id = match EventIdentity::parse(url) {
            Ok(id) => id,
            Err(e) => return fail(e.into(), "delete event"),
        };
        match self.delete(&id) {
            Ok(()) => OperationResult::ok(()).with_event_url(self.canonical_event_url(&id)),
            Err(e) => fail(e, "delete event"),
        }
    }

    /// Marks an event cancelled by prefixing its name.
    pub fn cancel_event(&mut self, url: &str) -> OperationResult<NormalizedEvent> {
        let result = self.transition(url, |name| {
            EventState::cancelled_name(name)
                .ok_or_else(|| RemoteError::already_cancelled("event is already cancelled"))
        });
        self.event_result(result, "cancel event")
    }

    /// Removes the cancellation prefix from an event's name.
    pub fn reinstate_event(&mut self, url: &str) -> OperationResult<NormalizedEvent> {
        let result = self.transition(url, |name| {
            EventState::reinstated_name(name)
                .ok_or_else(|| RemoteError::not_cancelled("event is not cancelled"))
        });
        self.event_result(result, "reinstate event")
    }

    /// Copies a template event and optionally renames the copy.
    ///
    /// Uses the session scheme. The new event's URL is read off the redirect.
    pub fn copy_template(&mut self, template_url: &str, name: Option<&str>) -> OperationResult<String> {
        let result = EventIdentity::parse(template_url)
            .map_err(RemoteError::from)
            .and_then(|template| self.copy(&template))
            .and_then(|(url, id)| {
                if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                    self.apply_edit(&id, &NormalizedEvent::new(name.trim()))?;
                }
                Ok(url)
            });
        match result {
            Ok(url) => OperationResult::ok(url.clone()).with_event_url(url),
            Err(e) => fail(e, "copy template"),
        }
    }

    pub(crate) fn event_endpoint(&self, dialect: Dialect, id: &EventIdentity) -> String {
        match dialect {
            Dialect::Web => self.endpoint(&format!("events/{}.json", id.id())),
            Dialect::V1 => self.endpoint(&format!("api/v1/events/{}.json", id.id())),
        }
    }

    pub(crate) fn canonical_event_url(&self, id: &EventIdentity) -> String {
        id.canonical_url(self.config.base())
    }

    /// Wraps an event outcome, attaching the event URL on success.
    pub(crate) fn event_result(
        &self,
        result: RemoteResult<NormalizedEvent>,
        context: &str,
    ) -> OperationResult<NormalizedEvent> {
        match result {
            Ok(event) => {
                let url = event.url.clone();
                let result = OperationResult::ok(event);
                match url {
                    Some(url) => result.with_event_url(url),
                    None => result,
                }
            }
            Err(e) => fail(e, context),
        }
    }

    /// Fills in an absolute canonical URL for `event`.
    fn with_canonical_url(&self, mut event: NormalizedEvent, id: Option<&EventIdentity>) -> NormalizedEvent {
        event.url = match (event.url.take(), id) {
            (Some(url), _) => Some(self.config.absolute_url(&url)),
            (None, Some(id)) => Some(self.canonical_event_url(id)),
            (None, None) => event
                .id
                .as_deref()
                .and_then(EventIdentity::from_numeric)
                .map(|id| self.canonical_event_url(&id)),
        };
        event
    }

    pub(crate) fn fetch_event(&mut self, id: &EventIdentity) -> RemoteResult<NormalizedEvent> {
        let dialect = self.config.event_dialect;
        let request = HttpRequest::get(self.event_endpoint(dialect, id));
        let response = self.send_ok(dialect.auth_scheme(), request, "get event")?;
        let body: Value = response.json()?;
        let mut event = from_dialect_response(dialect, &body, self.config.default_utc_offset)?;
        event.id.get_or_insert_with(|| id.id().to_string());
        Ok(self.with_canonical_url(event, Some(id)))
    }

    /// Submits an edit as the strategy's sequence of PUTs.
    ///
    /// Stops at the first failing pass. The returned event is read from the
    /// last response, or echoes `fields` when that response has no body.
    pub(crate) fn apply_edit(
        &mut self,
        id: &EventIdentity,
        fields: &NormalizedEvent,
    ) -> RemoteResult<NormalizedEvent> {
        if touched_fields(fields).is_empty() {
            return Err(RemoteError::validation("no fields to edit"));
        }

        let dialect = self.config.event_dialect;
        let passes = self.edit_strategy.passes(fields);
        if passes.is_empty() {
            return Err(RemoteError::configuration(format!(
                "edit strategy '{}' produced no passes",
                self.edit_strategy.name()
            )));
        }

        let total = passes.len();
        let mut last_body = String::new();
        for (index, pass) in passes.iter().enumerate() {
            debug!(
                event = %id,
                strategy = self.edit_strategy.name(),
                pass = index + 1,
                total,
                "submitting edit"
            );
            let payload = to_dialect_payload(dialect, pass);
            let request = HttpRequest::put(self.event_endpoint(dialect, id)).json(&payload)?;
            last_body = self.send_ok(dialect.auth_scheme(), request, "edit event")?.body;
        }

        let echoed = || {
            let mut event = fields.clone();
            event.id = Some(id.id().to_string());
            event
        };
        let event = match serde_json::from_str::<Value>(&last_body) {
            Ok(body) if body.is_object() => {
                let mut event = from_dialect_response(dialect, &body, self.config.default_utc_offset)?;
                event.id.get_or_insert_with(|| id.id().to_string());
                if event.name.is_empty() {
                    event.name = fields.name.clone();
                }
                event
            }
            _ => echoed(),
        };
        Ok(self.with_canonical_url(event, Some(id)))
    }

    pub(crate) fn create(
        &mut self,
        fields: &NormalizedEvent,
        logo: Option<&Logo>,
    ) -> RemoteResult<NormalizedEvent> {
        if fields.name.trim().is_empty() {
            return Err(RemoteError::validation("event name is required"));
        }

        let payload = to_dialect_payload(Dialect::V1, fields);
        let request = HttpRequest::post(self.endpoint("api/v1/events.json"));
        let request = match logo {
            Some(logo) => {
                let body = MultipartBody::for_event(&payload.fields()?, logo);
                request.bytes(body.content_type(), body.to_bytes(&logo.bytes))
            }
            None => request.json(&payload)?,
        };

        let response = self.send(AuthScheme::Basic, request, "create event")?;
        if response.status != 201 {
            return Err(error_from_response(&response, "create event"));
        }

        let body: Value = response.json()?;
        let mut event = from_dialect_response(Dialect::V1, &body, self.config.default_utc_offset)?;
        if event.id.is_none() {
            event.id = event
                .url
                .as_deref()
                .and_then(|url| EventIdentity::parse(&self.config.absolute_url(url)).ok())
                .map(|id| id.id().to_string());
        }
        if event.id.is_none() {
            return Err(RemoteError::invalid_response("created event has no id or URL")
                .with_status(response.status)
                .with_context("create event"));
        }

        let event = self.with_canonical_url(event, None);
        info!(event = event.url.as_deref().unwrap_or_default(), "event created");
        Ok(event)
    }

    pub(crate) fn delete(&mut self, id: &EventIdentity) -> RemoteResult<()> {
        let request = HttpRequest::delete(self.event_endpoint(Dialect::V1, id));
        let response = self.send(AuthScheme::Basic, request, "delete event")?;
        if response.status == 204 {
            info!(event = %id, "event deleted");
            Ok(())
        } else {
            Err(error_from_response(&response, "delete event"))
        }
    }

    /// get, rename, edit. The name is the only state there is.
    fn transition<F>(&mut self, url: &str, rename: F) -> RemoteResult<NormalizedEvent>
    where
        F: FnOnce(&str) -> RemoteResult<String>,
    {
        let id = EventIdentity::parse(url)?;
        let current = self.fetch_event(&id)?;
        let name = rename(&current.name)?;
        self.apply_edit(&id, &NormalizedEvent::new(name))
    }

    fn copy(&mut self, template: &EventIdentity) -> RemoteResult<(String, EventIdentity)> {
        let request =
            HttpRequest::post(format!("{}/copy", self.canonical_event_url(template))).without_redirects();
        let response = self.send(AuthScheme::Session, request, "copy template")?;

        let location = response
            .header("location")
            .filter(|_| response.is_redirect())
            .map(|l| self.config.absolute_url(l));
        match location.and_then(|url| EventIdentity::parse(&url).ok().map(|id| (url, id))) {
            Some((url, id)) => {
                info!(template = %template, event = %url, "template copied");
                Ok((url, id))
            }
            None => Err(error_from_response(&response, "copy template")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use ridesched_core::{RouteRef, Visibility};
    use serde_json::json;

    use crate::client::testing::{BASE, ScriptedTransport, client, signed_in_client};
    use crate::error::RemoteErrorCode;
    use crate::multipart::Logo;
    use crate::payload::Dialect;
    use crate::strategy::EditStrategyConfig;
    use crate::transport::{HttpMethod, HttpResponse};

    use super::*;

    const EVENT_URL: &str = "https://rides.test/events/188822-sat-a-ride";

    fn v1_event(name: &str) -> Value {
        json!({"event": {
            "id": 188822,
            "name": name,
            "description": "Coast loop",
            "start_date": "2025-01-25",
            "start_time": "09:30",
            "visibility": "public"
        }})
    }

    fn single_put_client(transport: ScriptedTransport) -> RemoteClient<ScriptedTransport> {
        RemoteClient::new(
            transport,
            crate::client::testing::credentials(),
            crate::client::testing::config().with_edit_strategy(EditStrategyConfig::Single),
        )
    }

    mod get {
        use super::*;

        #[test]
        fn fetches_via_basic_auth_and_normalizes() {
            let transport = ScriptedTransport::new().json(200, v1_event("Sat A Ride"));
            let mut client = client(transport);

            let result = client.get_event(EVENT_URL);
            assert!(result.is_success());
            let event = result.data().unwrap();
            assert_eq!(event.name, "Sat A Ride");
            assert_eq!(event.desc.as_deref(), Some("Coast loop"));
            assert_eq!(event.starts_at.unwrap().to_rfc3339(), "2025-01-25T09:30:00-08:00");
            assert_eq!(result.event_url(), Some("https://rides.test/events/188822"));

            let request = &client.transport().requests()[0];
            assert_eq!(request.url, format!("{BASE}/api/v1/events/188822.json"));
            assert!(request.header_value("Authorization").unwrap().starts_with("Basic "));
            assert!(request.header_value("Cookie").is_none());
        }

        #[test]
        fn invalid_url_never_reaches_network() {
            let mut client = client(ScriptedTransport::new());
            for url in ["", "https://rides.test/routes/5", "https://rides.test/events/abc"] {
                let result = client.get_event(url);
                assert_eq!(result.code(), Some(RemoteErrorCode::InvalidUrl), "{url}");
            }
            assert!(client.transport().requests().is_empty());
        }

        #[test]
        fn remote_failure_carries_status() {
            let transport = ScriptedTransport::new()
                .respond(HttpResponse::new(404, r#"{"message":"Record not found"}"#));
            let result = client(transport).get_event(EVENT_URL);
            assert!(!result.is_success());
            assert_eq!(
                result.error(),
                Some("get event failed (HTTP 404): Record not found")
            );
        }

        #[test]
        fn web_dialect_uses_session() {
            let transport = ScriptedTransport::new().json(
                200,
                json!({"id": 188822, "name": "Ride", "desc": "d", "starts_at": "2025-01-25T09:30:00-08:00"}),
            );
            let mut client = RemoteClient::new(
                transport,
                crate::client::testing::credentials(),
                crate::client::testing::config().with_event_dialect(Dialect::Web),
            );
            let unauthenticated = client.get_event(EVENT_URL);
            assert_eq!(unauthenticated.code(), Some(RemoteErrorCode::AuthRequired));

            client.auth.complete_login(&crate::client::testing::sign_in());
            let result = client.get_event(EVENT_URL);
            assert!(result.is_success(), "{:?}", result.error());
            let request = &client.transport().requests()[0];
            assert_eq!(request.url, format!("{BASE}/events/188822.json"));
            assert!(request.header_value("Cookie").is_some());
        }
    }

    mod edit {
        use super::*;

        fn full_fields() -> NormalizedEvent {
            NormalizedEvent::new("Sat A Ride")
                .with_starts_at(DateTime::parse_from_rfc3339("2025-01-25T09:30:00-08:00").unwrap())
                .with_location("Town clock")
                .with_visibility(Visibility::Public)
                .with_routes(vec![RouteRef::new("17166902")])
        }

        #[test]
        fn double_put_primes_all_day_first() {
            let transport = ScriptedTransport::new()
                .json(200, json!({}))
                .json(200, v1_event("Sat A Ride"));
            let mut client = client(transport);

            let result = client.edit_event(EVENT_URL, &full_fields());
            assert!(result.is_success(), "{:?}", result.error());

            let puts = client.transport().calls(HttpMethod::Put);
            assert_eq!(puts.len(), 2);
            let first: Value = serde_json::from_str(&puts[0].1).unwrap();
            let second: Value = serde_json::from_str(&puts[1].1).unwrap();
            assert_eq!(first["event"]["all_day"], true);
            assert_eq!(second["event"]["all_day"], false);
            assert_eq!(second["event"]["location"], "Town clock");
            assert_eq!(second["event"]["route_ids"], json!(["17166902"]));
            assert_eq!(puts[0].0, format!("{BASE}/api/v1/events/188822.json"));
        }

        #[test]
        fn single_put_submits_once() {
            let transport = ScriptedTransport::new().json(200, v1_event("Sat A Ride"));
            let mut client = single_put_client(transport);
            assert!(client.edit_event(EVENT_URL, &full_fields()).is_success());
            assert_eq!(client.transport().calls(HttpMethod::Put).len(), 1);
        }

        #[test]
        fn failed_priming_pass_stops_edit() {
            let transport = ScriptedTransport::new().respond(HttpResponse::new(500, ""));
            let mut client = client(transport);
            let result = client.edit_event(EVENT_URL, &full_fields());
            assert_eq!(result.error(), Some("edit event failed (HTTP 500)"));
            assert_eq!(client.transport().requests().len(), 1);
        }

        #[test]
        fn empty_body_echoes_fields() {
            let transport = ScriptedTransport::new().respond(HttpResponse::new(204, ""));
            let mut client = single_put_client(transport);
            let result = client.edit_event(EVENT_URL, &NormalizedEvent::new("Renamed"));
            let event = result.data().unwrap();
            assert_eq!(event.name, "Renamed");
            assert_eq!(event.id.as_deref(), Some("188822"));
        }

        #[test]
        fn nothing_to_edit_is_validation_error() {
            let mut client = client(ScriptedTransport::new());
            let result = client.edit_event(EVENT_URL, &NormalizedEvent::default());
            assert_eq!(result.code(), Some(RemoteErrorCode::Validation));
            assert!(client.transport().requests().is_empty());
        }
    }

    mod create {
        use super::*;

        fn created() -> Value {
            json!({"event": {"id": 190001, "name": "Sat A Ride", "url": "/events/190001-sat-a-ride"}})
        }

        #[test]
        fn posts_json_and_reads_self_reference() {
            let transport = ScriptedTransport::new().json(201, created());
            let mut client = client(transport);

            let result = client.create_event(&NormalizedEvent::new("Sat A Ride"), None);
            assert!(result.is_success(), "{:?}", result.error());
            assert_eq!(result.event_url(), Some("https://rides.test/events/190001-sat-a-ride"));
            assert_eq!(result.data().unwrap().id.as_deref(), Some("190001"));

            let request = &client.transport().requests()[0];
            assert_eq!(request.url, format!("{BASE}/api/v1/events.json"));
            assert_eq!(request.header_value("Content-Type"), Some("application/json"));
            assert_eq!(request.body_text(), Some(r#"{"event":{"name":"Sat A Ride"}}"#));
        }

        #[test]
        fn logo_switches_to_multipart() {
            let transport = ScriptedTransport::new().json(201, created());
            let mut client = client(transport);
            let logo = Logo::new("club.png", "image/png", b"PNGDATA".to_vec());

            assert!(client.create_event(&NormalizedEvent::new("Sat A Ride"), Some(&logo)).is_success());

            let request = &client.transport().requests()[0];
            let content_type = request.header_value("Content-Type").unwrap();
            assert!(content_type.starts_with("multipart/form-data; boundary="));
            let body = String::from_utf8_lossy(request.body.as_deref().unwrap()).to_string();
            assert!(body.contains("name=\"event[name]\"\r\n\r\nSat A Ride\r\n"));
            assert!(body.contains("name=\"event[logo]\"; filename=\"club.png\""));
            assert!(body.contains("PNGDATA"));
        }

        #[test]
        fn non_created_status_is_failure() {
            let transport = ScriptedTransport::new().json(200, created());
            let result = client(transport).create_event(&NormalizedEvent::new("Ride"), None);
            assert_eq!(result.code(), Some(RemoteErrorCode::RemoteError));
            assert!(result.error().unwrap().contains("HTTP 200"));
        }

        #[test]
        fn derives_id_from_url_when_missing() {
            let transport =
                ScriptedTransport::new().json(201, json!({"event": {"name": "R", "html_url": "https://rides.test/events/55"}}));
            let result = client(transport).create_event(&NormalizedEvent::new("R"), None);
            assert_eq!(result.data().unwrap().id.as_deref(), Some("55"));
        }

        #[test]
        fn name_is_required() {
            let mut client = client(ScriptedTransport::new());
            let result = client.create_event(&NormalizedEvent::new("  "), None);
            assert_eq!(result.code(), Some(RemoteErrorCode::Validation));
            assert!(client.transport().requests().is_empty());
        }
    }

    mod delete {
        use super::*;

        #[test]
        fn no_content_is_success() {
            let transport = ScriptedTransport::new().respond(HttpResponse::new(204, ""));
            let mut client = client(transport);
            let result = client.delete_event(EVENT_URL);
            assert!(result.is_success());
            assert_eq!(result.event_url(), Some("https://rides.test/events/188822"));
            assert_eq!(client.transport().requests()[0].method, HttpMethod::Delete);
        }

        #[test]
        fn other_status_is_failure_with_code() {
            for status in [200, 404, 500] {
                let transport = ScriptedTransport::new().respond(HttpResponse::new(status, ""));
                let result = client(transport).delete_event(EVENT_URL);
                assert!(!result.is_success());
                assert!(result.error().unwrap().contains(&format!("HTTP {status}")));
            }
        }
    }

    mod state_machine {
        use super::*;

        #[test]
        fn cancel_prefixes_name() {
            let transport = ScriptedTransport::new()
                .json(200, v1_event("Sat A Ride"))
                .respond(HttpResponse::new(204, ""));
            let mut client = single_put_client(transport);

            let result = client.cancel_event(EVENT_URL);
            assert_eq!(result.data().unwrap().name, "CANCELLED: Sat A Ride");

            let puts = client.transport().calls(HttpMethod::Put);
            assert_eq!(puts[0].1, r#"{"event":{"name":"CANCELLED: Sat A Ride"}}"#);
        }

        #[test]
        fn cancel_twice_is_already_cancelled() {
            let transport = ScriptedTransport::new()
                .json(200, v1_event("Sat A Ride"))
                .respond(HttpResponse::new(204, ""))
                .json(200, v1_event("CANCELLED: Sat A Ride"));
            let mut client = single_put_client(transport);

            assert!(client.cancel_event(EVENT_URL).is_success());
            let second = client.cancel_event(EVENT_URL);
            assert_eq!(second.code(), Some(RemoteErrorCode::AlreadyCancelled));
            assert_eq!(client.transport().calls(HttpMethod::Put).len(), 1);
        }

        #[test]
        fn reinstate_active_event_is_not_cancelled() {
            let transport = ScriptedTransport::new().json(200, v1_event("Sat A Ride"));
            let mut client = single_put_client(transport);
            let result = client.reinstate_event(EVENT_URL);
            assert_eq!(result.code(), Some(RemoteErrorCode::NotCancelled));
            assert_eq!(result.error(), Some("reinstate event: event is not cancelled"));
            assert!(client.transport().calls(HttpMethod::Put).is_empty());
        }

        #[test]
        fn cancel_then_reinstate_restores_name() {
            let original = "Sat A Ride (Coast) 9:00 AM";
            let transport = ScriptedTransport::new()
                .json(200, v1_event(original))
                .respond(HttpResponse::new(204, ""))
                .json(200, v1_event(&format!("CANCELLED: {original}")))
                .respond(HttpResponse::new(204, ""));
            let mut client = single_put_client(transport);

            assert!(client.cancel_event(EVENT_URL).is_success());
            let reinstated = client.reinstate_event(EVENT_URL);
            assert_eq!(reinstated.data().unwrap().name, original);
        }
    }

    mod template {
        use super::*;

        #[test]
        fn reads_location_off_redirect() {
            let transport = ScriptedTransport::new().respond(
                HttpResponse::new(302, "").with_header("Location", "/events/190002-copy"),
            );
            let mut client = signed_in_client(transport);

            let result = client.copy_template("https://rides.test/events/100-template", None);
            assert_eq!(result.data().map(String::as_str), Some("https://rides.test/events/190002-copy"));

            let request = &client.transport().requests()[0];
            assert_eq!(request.url, "https://rides.test/events/100/copy");
            assert!(!request.follow_redirects);
            assert!(request.header_value("Cookie").is_some());
        }

        #[test]
        fn renames_copy_when_name_given() {
            let transport = ScriptedTransport::new()
                .respond(HttpResponse::new(302, "").with_header("Location", "https://rides.test/events/7"))
                .respond(HttpResponse::new(204, ""));
            let mut client = signed_in_client(transport);
            assert!(client.copy_template("https://rides.test/events/100", Some("Sun Ride")).is_success());
            let puts = client.transport().calls(HttpMethod::Put);
            assert_eq!(puts[0].0, format!("{BASE}/api/v1/events/7.json"));
        }

        #[test]
        fn non_redirect_is_failure() {
            let transport = ScriptedTransport::new().respond(HttpResponse::new(200, "<html>"));
            let result = signed_in_client(transport).copy_template("https://rides.test/events/100", None);
            assert_eq!(result.error(), Some("copy template failed (HTTP 200)"));
        }

        #[test]
        fn requires_session() {
            let result = client(ScriptedTransport::new()).copy_template("https://rides.test/events/100", None);
            assert_eq!(result.code(), Some(RemoteErrorCode::AuthRequired));
        }
    }
}
