//! Blocking reqwest implementation of [`Transport`].
//!
//! Two clients are kept: one following redirects, one returning 3xx responses
//! untouched so callers can read `Location` and `Set-Cookie` off them.

use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::redirect::Policy;
use tracing::trace;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// HTTP transport backed by reqwest's blocking client.
pub struct ReqwestTransport {
    following: Client,
    manual: Client,
}

impl ReqwestTransport {
    /// Creates a transport using the timeout and user agent from `config`.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let build = |policy: Policy| {
            Client::builder()
                .timeout(config.timeout)
                .user_agent(&config.user_agent)
                .redirect(policy)
                .build()
                .map_err(|e| {
                    RemoteError::configuration(format!("Failed to create HTTP client: {}", e))
                        .with_source(e)
                })
        };

        Ok(Self {
            following: build(Policy::default())?,
            manual: build(Policy::none())?,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn into_response(response: Response) -> RemoteResult<HttpResponse> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.text().map_err(|e| {
        RemoteError::transport(format!("Failed to read response: {}", e))
            .with_status(status)
            .with_source(e)
    })?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

impl Transport for ReqwestTransport {
    fn fetch(&self, request: &HttpRequest) -> RemoteResult<HttpResponse> {
        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.manual
        };

        let mut builder = client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        trace!(method = %request.method, url = %request.url, "Sending request");

        let response = builder
            .send()
            .map_err(|e| RemoteError::transport(format!("Request failed: {}", e)).with_source(e))?;
        trace!(status = response.status().as_u16(), "Received response");
        into_response(response)
    }
}
