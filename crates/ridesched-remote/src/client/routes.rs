//! Route operations: fetch, import (copy then fetch then tag) and expiration.

use chrono::NaiveDate;
use ridesched_core::tags::{build_expires_tag, find_expires_tag, parse_expires_tag};
use ridesched_core::{ResourceKind, RouteIdentity, Tag};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::AuthScheme;
use crate::error::{RemoteError, RemoteResult};
use crate::error_result::error_from_response;
use crate::normalize::{RouteDetail, route_from_response};
use crate::result::OperationResult;
use crate::transport::{HttpRequest, Transport};

use super::tags::TagAction;
use super::{RemoteClient, fail};

/// Options for [`RemoteClient::import_route`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Name for the copy; the service keeps the source name when unset.
    pub name: Option<String>,
    /// Account that should own the copy.
    pub user_id: Option<String>,
    /// Tags to add once the copy exists.
    pub tags: Vec<Tag>,
    /// Adds an `expires:` tag for this date.
    pub expiry: Option<NaiveDate>,
}

/// Outcome of [`RemoteClient::set_route_expiration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationOutcome {
    /// True when the existing expiration was kept and nothing was written.
    pub skipped: bool,
    /// Date of the expiration tag found on the route, if any.
    pub previous: Option<NaiveDate>,
    /// The tag written, when not skipped.
    pub tag: Option<String>,
}

#[derive(Serialize)]
struct CopyRouteBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    asset_type: &'static str,
    privacy_code: Option<u8>,
    include_photos: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<T: Transport> RemoteClient<T> {
    /// Fetches a route through the versioned dialect.
    pub fn get_route(&mut self, url: &str) -> OperationResult<RouteDetail> {
        let result = RouteIdentity::parse(url)
            .map_err(RemoteError::from)
            .and_then(|id| self.fetch_route(&id));
        match result {
            Ok(route) => {
                let url = route.url.clone();
                let result = OperationResult::ok(route);
                match url {
                    Some(url) => result.with_route_url(url),
                    None => result,
                }
            }
            Err(e) => fail(e, "get route"),
        }
    }

    /// Copies a route into the club's account, fetches the copy and tags it.
    ///
    /// The import succeeds once the copy and the fetch succeed; a failed tag
    /// update only adds a warning.
    pub fn import_route(&mut self, source_url: &str, options: &ImportOptions) -> OperationResult<RouteDetail> {
        let source = match RouteIdentity::parse(source_url) {
            Ok(id) => id,
            Err(e) => return fail(e.into(), "import route"),
        };

        let copied = self
            .try_login()
            .and_then(|()| self.copy_route(&source, options))
            .and_then(|new_id| self.fetch_route(&new_id).map(|route| (new_id, route)));
        let (new_id, mut route) = match copied {
            Ok(copied) => copied,
            Err(e) => return fail(e, "import route"),
        };
        let route_url = route
            .url
            .clone()
            .unwrap_or_else(|| new_id.canonical_url(self.config.base()));

        let mut tags = options.tags.clone();
        if let Some(expiry) = options.expiry {
            tags.push(build_expires_tag(expiry));
        }

        let mut result_warnings = Vec::new();
        if !tags.is_empty() {
            let ids = [new_id.id().to_string()];
            match self.batch_tags(ResourceKind::Route, &ids, TagAction::Add, &tags) {
                Ok(()) => {
                    for tag in tags {
                        if !route.has_tag(tag.as_str()) {
                            route.tags.push(tag.into());
                        }
                    }
                }
                Err(e) => {
                    warn!(route = %route_url, error = %e, "route imported but tagging failed");
                    result_warnings.push(format!("route imported but tagging failed: {}", e));
                }
            }
        }

        info!(source = %source, route = %route_url, "route imported");
        result_warnings
            .into_iter()
            .fold(OperationResult::ok(route).with_route_url(route_url), |r, w| r.with_warning(w))
    }

    /// Sets a route's `expires:` tag.
    ///
    /// Without `force`, the write is skipped unless `date` is strictly later
    /// than the existing expiration, so an expiration window never shrinks.
    pub fn set_route_expiration(
        &mut self,
        url: &str,
        date: NaiveDate,
        force: bool,
    ) -> OperationResult<ExpirationOutcome> {
        let result = RouteIdentity::parse(url)
            .map_err(RemoteError::from)
            .and_then(|id| self.apply_expiration(&id, date, force).map(|o| (id, o)));
        match result {
            Ok((id, outcome)) => OperationResult::ok(outcome).with_route_url(id.canonical_url(self.config.base())),
            Err(e) => fail(e, "set route expiration"),
        }
    }

    fn apply_expiration(
        &mut self,
        id: &RouteIdentity,
        date: NaiveDate,
        force: bool,
    ) -> RemoteResult<ExpirationOutcome> {
        let route = self.fetch_route(id)?;
        let previous = find_expires_tag(route.tags.iter().map(String::as_str)).map(|(_, d)| d);

        if let Some(previous) = previous
            && !force
            && date <= previous
        {
            info!(route = %id, %previous, requested = %date, "keeping later expiration");
            return Ok(ExpirationOutcome {
                skipped: true,
                previous: Some(previous),
                tag: None,
            });
        }

        let tag = build_expires_tag(date);
        let ids = [id.id().to_string()];
        let stale = route
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| parse_expires_tag(t).is_some() && *t != tag.as_str())
            .map(|t| Tag::new(t).map_err(|e| RemoteError::invalid_response(e.to_string())))
            .collect::<RemoteResult<Vec<_>>>()?;
        if !stale.is_empty() {
            self.batch_tags(ResourceKind::Route, &ids, TagAction::Remove, &stale)?;
        }
        self.batch_tags(ResourceKind::Route, &ids, TagAction::Add, std::slice::from_ref(&tag))?;

        Ok(ExpirationOutcome {
            skipped: false,
            previous,
            tag: Some(tag.into()),
        })
    }

    pub(crate) fn fetch_route(&mut self, id: &RouteIdentity) -> RemoteResult<RouteDetail> {
        let request = HttpRequest::get(self.endpoint(&format!("api/v1/routes/{}.json", id.id())));
        let response = self.send_ok(AuthScheme::Basic, request, "get route")?;
        let body: Value = response.json()?;
        let mut route = route_from_response(&body)?;
        route.url = Some(match route.url.take() {
            Some(url) => self.config.absolute_url(&url),
            None => id.canonical_url(self.config.base()),
        });
        Ok(route)
    }

    /// Copies a route. The response carries a success flag and the new URL.
    fn copy_route(&mut self, source: &RouteIdentity, options: &ImportOptions) -> RemoteResult<RouteIdentity> {
        let body = CopyRouteBody {
            user_id: options.user_id.as_deref(),
            asset_type: "route",
            privacy_code: None,
            include_photos: false,
            name: options.name.as_deref(),
        };
        let request =
            HttpRequest::post(self.endpoint(&format!("routes/{}/copy.json", source.id()))).json(&body)?;
        let response = self.send_ok(AuthScheme::Session, request, "copy route")?;
        let reply: Value = response.json()?;

        let succeeded = matches!(reply.get("success"), Some(v) if *v == json!(true) || *v == json!(1));
        let new_url = reply.get("url").and_then(Value::as_str).map(|u| self.config.absolute_url(u));
        match (succeeded, new_url) {
            (true, Some(url)) => {
                let id = RouteIdentity::parse(&url).map_err(|e| {
                    RemoteError::invalid_response(format!("copy returned an unexpected URL: {}", url))
                        .with_source(e)
                })?;
                info!(source = %source, route = %url, "route copied");
                Ok(id)
            }
            _ => Err(error_from_response(&response, "copy route")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::testing::{BASE, ScriptedTransport, client, sign_in, signed_in_client};
    use crate::error::RemoteErrorCode;
    use crate::transport::{HttpMethod, HttpResponse};

    use super::*;

    const SOURCE: &str = "https://rides.test/routes/50123-coast-loop";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn route(id: u64, tags: &[&str]) -> Value {
        json!({"route": {"id": id, "name": "Coast Loop", "tag_names": tags}})
    }

    mod get {
        use super::*;

        #[test]
        fn unwraps_route_envelope() {
            let transport = ScriptedTransport::new().json(200, route(50123, &["club"]));
            let mut client = client(transport);
            let result = client.get_route(SOURCE);
            assert!(result.is_success());
            assert_eq!(result.data().unwrap().tags, ["club"]);
            assert_eq!(result.route_url(), Some("https://rides.test/routes/50123"));
            assert_eq!(
                client.transport().requests()[0].url,
                format!("{BASE}/api/v1/routes/50123.json")
            );
        }

        #[test]
        fn event_url_is_invalid() {
            let result = client(ScriptedTransport::new()).get_route("https://rides.test/events/50123");
            assert_eq!(result.code(), Some(RemoteErrorCode::InvalidUrl));
        }
    }

    mod import {
        use super::*;

        fn options() -> ImportOptions {
            ImportOptions {
                name: Some("Club: Coast Loop".to_string()),
                user_id: Some("621846".to_string()),
                tags: vec![Tag::new("club").unwrap()],
                expiry: Some(date(2025, 3, 15)),
            }
        }

        fn scripted(tag_status: u16) -> ScriptedTransport {
            ScriptedTransport::new()
                .respond(sign_in())
                .json(200, json!({"success": 1, "url": "/routes/60001"}))
                .json(200, route(60001, &[]))
                .respond(HttpResponse::new(tag_status, ""))
        }

        #[test]
        fn copies_fetches_and_tags() {
            let mut client = client(scripted(200));
            let result = client.import_route(SOURCE, &options());

            assert!(result.is_success(), "{:?}", result.error());
            assert!(result.warnings().is_empty());
            assert_eq!(result.route_url(), Some("https://rides.test/routes/60001"));
            assert_eq!(result.data().unwrap().tags, ["club", "expires: 03/15/2025"]);

            let posts = client.transport().calls(HttpMethod::Post);
            assert_eq!(posts[1].0, format!("{BASE}/routes/50123/copy.json"));
            let copy: Value = serde_json::from_str(&posts[1].1).unwrap();
            assert_eq!(
                copy,
                json!({
                    "user_id": "621846",
                    "asset_type": "route",
                    "privacy_code": null,
                    "include_photos": false,
                    "name": "Club: Coast Loop"
                })
            );
            let tags: Value = serde_json::from_str(&posts[2].1).unwrap();
            assert_eq!(tags["route_ids"], "60001");
            assert_eq!(tags["tag_names"], "club,expires: 03/15/2025");
        }

        #[test]
        fn tag_failure_is_only_a_warning() {
            let mut client = client(scripted(500));
            let result = client.import_route(SOURCE, &options());

            assert!(result.is_success());
            assert_eq!(result.route_url(), Some("https://rides.test/routes/60001"));
            assert_eq!(result.data().unwrap().id, "60001");
            assert!(result.data().unwrap().tags.is_empty());
            assert_eq!(result.warnings().len(), 1);
            assert!(result.warnings()[0].contains("HTTP 500"));
        }

        #[test]
        fn no_tags_means_no_tag_call() {
            let transport = ScriptedTransport::new()
                .respond(sign_in())
                .json(200, json!({"success": true, "url": "https://rides.test/routes/60001"}))
                .json(200, route(60001, &[]));
            let mut client = client(transport);
            assert!(client.import_route(SOURCE, &ImportOptions::default()).is_success());
            assert_eq!(client.transport().calls(HttpMethod::Post).len(), 2);
        }

        #[test]
        fn copy_without_success_flag_fails() {
            let transport = ScriptedTransport::new()
                .respond(sign_in())
                .json(200, json!({"success": false}));
            let result = client(transport).import_route(SOURCE, &ImportOptions::default());
            assert_eq!(result.code(), Some(RemoteErrorCode::RemoteError));
            assert!(result.error().unwrap().starts_with("copy route failed (HTTP 200)"));
        }

        #[test]
        fn login_failure_stops_import() {
            let transport = ScriptedTransport::new().respond(HttpResponse::new(200, "bad login"));
            let mut client = client(transport);
            let result = client.import_route(SOURCE, &ImportOptions::default());
            assert_eq!(result.code(), Some(RemoteErrorCode::AuthFailed));
            assert_eq!(client.transport().requests().len(), 1);
        }
    }

    mod expiration {
        use super::*;

        #[test]
        fn earlier_date_is_skipped_without_writes() {
            let transport =
                ScriptedTransport::new().json(200, route(50123, &["club", "expires: 03/15/2025"]));
            let mut client = signed_in_client(transport);

            let result = client.set_route_expiration(SOURCE, date(2025, 2, 1), false);
            let outcome = result.data().unwrap();
            assert!(outcome.skipped);
            assert_eq!(outcome.previous, Some(date(2025, 3, 15)));
            assert!(client.transport().calls(HttpMethod::Post).is_empty());
        }

        #[test]
        fn force_writes_regardless() {
            let transport = ScriptedTransport::new()
                .json(200, route(50123, &["expires: 03/15/2025"]))
                .respond(HttpResponse::new(200, ""))
                .respond(HttpResponse::new(200, ""));
            let mut client = signed_in_client(transport);

            let result = client.set_route_expiration(SOURCE, date(2025, 2, 1), true);
            let outcome = result.data().unwrap();
            assert!(!outcome.skipped);
            assert_eq!(outcome.tag.as_deref(), Some("expires: 02/01/2025"));

            let posts = client.transport().calls(HttpMethod::Post);
            assert_eq!(posts.len(), 2);
            let remove: Value = serde_json::from_str(&posts[0].1).unwrap();
            let add: Value = serde_json::from_str(&posts[1].1).unwrap();
            assert_eq!(remove["tag_action"], "remove");
            assert_eq!(remove["tag_names"], "expires: 03/15/2025");
            assert_eq!(add["tag_action"], "add");
            assert_eq!(add["tag_names"], "expires: 02/01/2025");
        }

        #[test]
        fn later_date_is_written() {
            let transport = ScriptedTransport::new()
                .json(200, route(50123, &["Expires: 03/15/2025"]))
                .respond(HttpResponse::new(200, ""))
                .respond(HttpResponse::new(200, ""));
            let mut client = signed_in_client(transport);
            let result = client.set_route_expiration(SOURCE, date(2025, 4, 1), false);
            assert!(!result.data().unwrap().skipped);
            assert_eq!(client.transport().remaining(), 0);
        }

        #[test]
        fn untagged_route_gets_single_add() {
            let transport = ScriptedTransport::new()
                .json(200, route(50123, &[]))
                .respond(HttpResponse::new(200, ""));
            let mut client = signed_in_client(transport);
            let outcome = client.set_route_expiration(SOURCE, date(2025, 2, 1), false);
            assert_eq!(outcome.data().unwrap().previous, None);
            assert_eq!(client.transport().calls(HttpMethod::Post).len(), 1);
        }

        #[test]
        fn every_stale_expiration_is_removed() {
            let transport = ScriptedTransport::new()
                .json(
                    200,
                    route(
                        50123,
                        &[
                            "expires: 03/15/2025",
                            "club",
                            "EXPIRES: 03/01/2025",
                            "expires: 05/01/2025",
                        ],
                    ),
                )
                .respond(HttpResponse::new(200, ""))
                .respond(HttpResponse::new(200, ""));
            let mut client = signed_in_client(transport);

            let outcome = client.set_route_expiration(SOURCE, date(2025, 5, 1), true);
            assert_eq!(outcome.data().unwrap().previous, Some(date(2025, 3, 15)));

            let posts = client.transport().calls(HttpMethod::Post);
            assert_eq!(posts.len(), 2);
            let remove: Value = serde_json::from_str(&posts[0].1).unwrap();
            assert_eq!(remove["tag_action"], "remove");
            assert_eq!(remove["tag_names"], "expires: 03/15/2025,EXPIRES: 03/01/2025");
            let add: Value = serde_json::from_str(&posts[1].1).unwrap();
            assert_eq!(add["tag_names"], "expires: 05/01/2025");
        }

        #[test]
        fn same_date_with_force_only_adds() {
            let transport = ScriptedTransport::new()
                .json(200, route(50123, &["expires: 03/15/2025"]))
                .respond(HttpResponse::new(200, ""));
            let mut client = signed_in_client(transport);
            let result = client.set_route_expiration(SOURCE, date(2025, 3, 15), true);
            assert!(result.is_success());
            assert_eq!(client.transport().calls(HttpMethod::Post).len(), 1);
        }
    }
}
