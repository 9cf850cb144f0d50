//! The request value handed to the retrying client.

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::Cancellation;

/// A fully built HTTP request.
///
/// The body is buffered so the same request can be sent once per attempt.
/// Each request carries a cancellation token and an optional deadline; the
/// client stops retrying as soon as either fires.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Request {
    /// Creates a request with no headers, no body and a fresh cancellation token.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Ties the request to `token`; cancelling it aborts the in-flight call
    /// and any pending wait between attempts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation if the request has already been given up on.
    pub fn interrupted(&self) -> Option<Cancellation> {
        if self.cancel.is_cancelled() {
            return Some(Cancellation::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancellation::DeadlineExceeded),
            _ => None,
        }
    }

    /// Completes when the request is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> Cancellation {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Cancellation::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Cancellation::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                Cancellation::Cancelled
            }
        }
    }
}
