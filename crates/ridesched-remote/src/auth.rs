//! Authentication for the two API dialects.
//!
//! - **Session scheme** (legacy dialect): a cookie obtained by signing in with
//!   username and password, attached to every session-scheme request.
//! - **Basic scheme** (versioned dialect): `Basic base64(apiKey:authToken)`,
//!   computed per request and never derived from username/password.

use std::fmt;

use base64::Engine;
use tracing::{debug, trace};

use crate::error::{RemoteError, RemoteResult};
use crate::transport::{HttpRequest, HttpResponse};

/// Credentials held by a client for its whole lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API key for Basic-Auth calls.
    pub api_key: String,
    /// Auth token for Basic-Auth calls.
    pub auth_token: String,
    /// Username (email) for the session sign-in.
    pub username: String,
    /// Password for the session sign-in.
    pub password: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        auth_token: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            auth_token: auth_token.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns true if the Basic-Auth pair is present.
    pub fn has_api_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.auth_token.is_empty()
    }

    /// Returns true if the sign-in pair is present.
    pub fn has_login_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("auth_token", &redact(&self.auth_token))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<redacted>" }
}

/// Which authentication scheme a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    Session,
    Basic,
}

/// Generates a Basic authentication header value.
pub fn basic_auth(api_key: &str, auth_token: &str) -> String {
    let credentials = format!("{}:{}", api_key, auth_token);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {}", encoded)
}

/// Extracts the `name=value` pair of the session cookie from a response.
///
/// Only `Set-Cookie` headers whose cookie name starts with `prefix` count.
/// Attributes after the first `;` (path, expiry, flags) are dropped.
pub fn extract_session_cookie(response: &HttpResponse, prefix: &str) -> Option<String> {
    response
        .header_values("set-cookie")
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, value)| name.trim().starts_with(prefix) && !value.is_empty())
        })
        .map(str::to_string)
}

/// In-memory session state: present or absent, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookie: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the held cookie, if any.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn is_established(&self) -> bool {
        self.cookie.is_some()
    }

    /// Replaces the held cookie if `response` sets a fresh session cookie.
    ///
    /// Returns true if the cookie was replaced.
    pub fn observe(&mut self, response: &HttpResponse, prefix: &str) -> bool {
        match extract_session_cookie(response, prefix) {
            Some(cookie) => {
                trace!("session cookie refreshed");
                self.cookie = Some(cookie);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cookie = None;
    }
}

/// Produces authenticated requests for either scheme.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Credentials,
    session: Session,
    cookie_prefix: String,
}

impl Authenticator {
    pub fn new(credentials: Credentials, cookie_prefix: impl Into<String>) -> Self {
        Self {
            credentials,
            session: Session::new(),
            cookie_prefix: cookie_prefix.into(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Builds the sign-in request for the session scheme.
    ///
    /// Redirects are never followed: the cookie arrives on the 3xx response.
    pub fn login_request(&self, sign_in_url: &str) -> RemoteResult<HttpRequest> {
        if !self.credentials.has_login_credentials() {
            return Err(RemoteError::configuration(
                "username and password are required to sign in",
            ));
        }
        Ok(HttpRequest::post(sign_in_url)
            .form(&[
                ("user[email]", self.credentials.username.as_str()),
                ("user[password]", self.credentials.password.as_str()),
            ])
            .without_redirects())
    }

    /// Records the outcome of a sign-in. Returns true if a cookie is now held.
    pub fn complete_login(&mut self, response: &HttpResponse) -> bool {
        self.session.clear();
        self.session.observe(response, &self.cookie_prefix)
    }

    /// Picks up a refreshed session cookie from any session-scheme response.
    pub fn observe(&mut self, response: &HttpResponse) {
        if self.session.is_established() {
            self.session.observe(response, &self.cookie_prefix);
        }
    }

    /// Attaches the headers for `scheme` to `request`.
    ///
    /// # Errors
    ///
    /// - `AuthRequired` for the session scheme when no cookie is held
    /// - `Configuration` for the Basic scheme when the API key pair is missing
    pub fn authorize(&self, scheme: AuthScheme, request: HttpRequest) -> RemoteResult<HttpRequest> {
        debug!(method = %request.method, url = %request.url, ?scheme, "authorizing request");
        match scheme {
            AuthScheme::Session => {
                let cookie = self.session.cookie().ok_or_else(|| {
                    RemoteError::auth_required("no session held; call login() first")
                })?;
                Ok(request.header("Cookie", cookie))
            }
            AuthScheme::Basic => {
                if !self.credentials.has_api_credentials() {
                    return Err(RemoteError::configuration(
                        "api key and auth token are required for the versioned API",
                    ));
                }
                Ok(request.header(
                    "Authorization",
                    basic_auth(&self.credentials.api_key, &self.credentials.auth_token),
                ))
            }
        }
    }
}
