//! HTTP transport contract.
//!
//! The orchestration layer never dials a socket itself. It hands fully built
//! [`HttpRequest`]s to a caller-supplied [`Transport`] and interprets the
//! [`HttpResponse`]s that come back. Transports must not retry, must not
//! interpret status codes, and must not treat a non-2xx status as an error.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RemoteError, RemoteResult};

/// HTTP methods used against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to be executed by a [`Transport`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// When false the transport must hand back 3xx responses as-is.
    pub follow_redirects: bool,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            follow_redirects: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body and the matching content type.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> RemoteResult<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| {
            RemoteError::validation(format!("failed to serialize request body: {}", e))
                .with_source(e)
        })?;
        Ok(self.bytes("application/json", bytes))
    }

    /// Sets a URL-encoded form body.
    pub fn form<K, V>(self, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = fields
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k.as_ref()),
                    urlencoding::encode(v.as_ref())
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        self.bytes("application/x-www-form-urlencoded", encoded.into_bytes())
    }

    /// Sets a raw body with the given content type.
    pub fn bytes(mut self, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));
        self.headers.push(("Content-Type".to_string(), content_type.into()));
        self.body = Some(body);
        self
    }

    /// Disables redirect following for this request.
    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Returns the first header value with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the body as UTF-8 text, if it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl fmt::Debug for HttpRequest {
    // Header values are left out: they carry credentials and cookies.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("follow_redirects", &self.follow_redirects)
            .finish()
    }
}

/// A response as returned by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Builder method to add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 3xx statuses.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Returns the first header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns every value of a repeated header such as `Set-Cookie`.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> RemoteResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            RemoteError::invalid_response(format!("failed to parse response: {}", e))
                .with_status(self.status)
                .with_source(e)
        })
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes HTTP requests on behalf of the orchestration layer.
///
/// Implementations return `Err` only when no response was obtained at all
/// (connection refused, timeout, TLS failure). Any response, whatever its
/// status, is returned as `Ok`.
pub trait Transport {
    fn fetch(&self, request: &HttpRequest) -> RemoteResult<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, request: &HttpRequest) -> RemoteResult<HttpResponse> {
        (**self).fetch(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn fetch(&self, request: &HttpRequest) -> RemoteResult<HttpResponse> {
        (**self).fetch(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_body_is_url_encoded() {
        let req = HttpRequest::post("https://example.com/sign_in")
            .form(&[("user[email]", "a@b.c"), ("user[password]", "p w&d")]);
        assert_eq!(
            req.body_text().unwrap(),
            "user%5Bemail%5D=a%40b.c&user%5Bpassword%5D=p%20w%26d"
        );
        assert_eq!(
            req.header_value("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn json_body_replaces_content_type() {
        let req = HttpRequest::put("https://example.com/x")
            .header("Content-Type", "text/plain")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(req.body_text(), Some(r#"{"a":1}"#));
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn redirects_followed_by_default() {
        let req = HttpRequest::get("https://example.com");
        assert!(req.follow_redirects);
        assert!(!req.without_redirects().follow_redirects);
    }

    #[test]
    fn debug_hides_header_values() {
        let req = HttpRequest::get("https://example.com").header("Cookie", "secret=1");
        let debug = format!("{:?}", req);
        assert!(debug.contains("Cookie"));
        assert!(!debug.contains("secret=1"));
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let resp = HttpResponse::new(302, "")
            .with_header("location", "https://example.com/events/1")
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2");
        assert!(resp.is_redirect());
        assert!(!resp.is_success());
        assert_eq!(resp.header("Location"), Some("https://example.com/events/1"));
        assert_eq!(resp.header_values("SET-COOKIE").collect::<Vec<_>>(), ["a=1", "b=2"]);
    }

    #[test]
    fn response_json_errors_are_invalid_response() {
        let resp = HttpResponse::new(200, "<html>");
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err.code(), crate::error::RemoteErrorCode::InvalidResponse);
        assert_eq!(err.status(), Some(200));
    }
}
