//! The I/O seam of the retrying client.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use super::error::{ConfigError, TransportError};
use super::request::Request;
use super::response::Response;

/// Per-call timeout applied by [`ReqwestTransport`] unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one request and returns whatever the server answered.
///
/// Non-success statuses are responses, not errors; only failures to get a
/// response at all are reported as [`TransportError`]. Implementations must
/// tolerate concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a reqwest client with the given per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("rehttp/", env!("REHTTP_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(ConfigError::Transport)?;

        Ok(Self { client })
    }

    /// Sends through a caller-configured reqwest client.
    ///
    /// The client's own timeout, redirect policy and default headers apply;
    /// nothing is added on top.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        debug!(
            "{} {} -> {} {} ({} bytes)",
            request.method(),
            request.url(),
            url,
            status,
            body.len()
        );

        Ok(Response::new(status)
            .with_headers(headers)
            .with_url(url)
            .with_body(body.to_vec()))
    }
}
