//! REST client
//!
//! Presents itself as a wire-protocol connection while issuing HTTP
//! requests against a remote REST endpoint. Commands are queued on a
//! [`Request`] and transmitted in one round trip: a single queued command
//! is POSTed to the base endpoint, two or more are POSTed to the
//! `/pipeline` sub-resource as a non-atomic batch.

mod request;

pub use request::{Destination, Request};

/// A REST API client.
///
/// Safe for concurrent use; each logical exchange goes through a
/// [`Request`] created by [`Client::new_request`], which is not.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_token: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for the given REST endpoint and API token.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self::with_http_client(base_url, api_token, reqwest::Client::new())
    }

    /// Create a client using a preconfigured HTTP client (timeouts,
    /// proxies, TLS settings, ...).
    pub fn with_http_client(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            http,
        }
    }

    /// Start a new request using this client's API token.
    pub fn new_request(&self) -> Request<'_> {
        Request::new(self, self.api_token.clone())
    }

    /// Start a new request authenticated with a different bearer token,
    /// e.g. one issued by the `ACL RESTTOKEN` command, while sharing this
    /// client's configuration.
    pub fn new_request_with_token(&self, token: impl Into<String>) -> Request<'_> {
        Request::new(self, token.into())
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
