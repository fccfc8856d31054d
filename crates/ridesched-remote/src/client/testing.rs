//! Scripted transport and client builders for workflow tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::auth::Credentials;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

use super::RemoteClient;

pub(crate) const BASE: &str = "https://rides.test";

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<RemoteResult<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, response: HttpResponse) -> Self {
        self.responses.borrow_mut().push_back(Ok(response));
        self
    }

    pub(crate) fn json(self, status: u16, body: serde_json::Value) -> Self {
        self.respond(HttpResponse::new(status, body.to_string()))
    }

    pub(crate) fn fail(self, error: RemoteError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// Requests matching `method`, as `(url, body text)` pairs.
    pub(crate) fn calls(&self, method: HttpMethod) -> Vec<(String, String)> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .map(|r| (r.url.clone(), r.body_text().unwrap_or_default().to_string()))
            .collect()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&self, request: &HttpRequest) -> RemoteResult<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(RemoteError::transport(format!(
                "no scripted response for {} {}",
                request.method, request.url
            )))
        })
    }
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("key", "token", "rider@example.com", "hunter2")
}

pub(crate) fn config() -> RemoteConfig {
    RemoteConfig::new(BASE)
        .expect("valid test base URL")
        .with_organization_id("47")
}

pub(crate) fn client(transport: ScriptedTransport) -> RemoteClient<ScriptedTransport> {
    RemoteClient::new(transport, credentials(), config())
}

/// Sign-in response carrying a session cookie.
pub(crate) fn sign_in() -> HttpResponse {
    HttpResponse::new(302, "").with_header("Set-Cookie", "_rwgps_3_session=s3ss10n; path=/")
}

/// A client that already holds a session, without a scripted sign-in call.
pub(crate) fn signed_in_client(transport: ScriptedTransport) -> RemoteClient<ScriptedTransport> {
    let mut client = client(transport);
    client.auth.complete_login(&sign_in());
    client
}
