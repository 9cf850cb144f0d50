//! HTTP client with bounded retries, jittered backoff and cancellation.

use log::{debug, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::backoff::{Backoff, JitteredBackoff};
use super::classify::{Classify, StatusClassifier, Verdict};
use super::error::{AttemptError, ConfigError, RetryError};
use super::request::Request;
use super::response::Response;
use super::transport::{DEFAULT_TIMEOUT, ReqwestTransport, Transport};

/// Attempts per request unless overridden.
pub const DEFAULT_ATTEMPTS: u32 = 6;

/// Retry policy shared by every call made through a [`Client`].
///
/// Validated on construction and never changed afterwards.
#[derive(Clone)]
pub struct RetryConfig {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    classifier: Arc<dyn Classify>,
}

impl RetryConfig {
    pub fn new(
        max_attempts: u32,
        backoff: Arc<dyn Backoff>,
        classifier: Arc<dyn Classify>,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts(max_attempts));
        }
        Ok(Self {
            max_attempts,
            backoff,
            classifier,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &dyn Backoff {
        self.backoff.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classify {
        self.classifier.as_ref()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            backoff: Arc::new(JitteredBackoff::new()),
            classifier: Arc::new(StatusClassifier),
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Construction options for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    max_attempts: Option<u32>,
    timeout: Option<Duration>,
    backoff: Option<Arc<dyn Backoff>>,
    classifier: Option<Arc<dyn Classify>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts per request, including the first one (default 6).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Timeout of each transport call (default 30s). Must be non-zero.
    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    pub fn classifier(mut self, classifier: impl Classify + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Replaces the default reqwest transport. The transport brings its own
    /// timeout; [`timeout`](Self::timeout) no longer applies. Use
    /// [`ReqwestTransport::from_client`] to keep reqwest with custom settings.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Client, ConfigError> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout);
        }

        let config = RetryConfig::new(
            self.max_attempts.unwrap_or(DEFAULT_ATTEMPTS),
            self.backoff
                .unwrap_or_else(|| Arc::new(JitteredBackoff::new())),
            self.classifier.unwrap_or_else(|| Arc::new(StatusClassifier)),
        )?;

        let transport = match self.transport {
            Some(transport) => {
                if let Some(timeout) = self.timeout {
                    debug!(
                        "custom transport supplied, ignoring timeout of {:?}",
                        timeout
                    );
                }
                transport
            }
            None => Arc::new(ReqwestTransport::with_timeout(
                self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            )?),
        };

        Ok(Client {
            transport,
            config: Arc::new(config),
        })
    }
}

/// Retrying HTTP client.
///
/// Cloning is cheap; clones share the transport and the retry policy.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<RetryConfig>,
}

impl Client {
    /// Creates a client with default options.
    pub fn new() -> Result<Self, ConfigError> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Sends `request`, retrying transient failures.
    ///
    /// Returns the first response the classifier accepts. Fails with
    /// [`RetryError::Exhausted`] once every attempt has failed, or with
    /// [`RetryError::Cancelled`] as soon as the request is cancelled or its
    /// deadline passes. No wait happens after the last attempt.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: &Request) -> Result<Response, RetryError> {
        let max_attempts = self.config.max_attempts();
        let mut attempt = 1;

        loop {
            if let Some(cancellation) = request.interrupted() {
                return Err(RetryError::Cancelled(cancellation));
            }

            let result = tokio::select! {
                biased;
                cancellation = request.cancelled() => return Err(RetryError::Cancelled(cancellation)),
                result = self.transport.send(request) => result,
            };

            let error = match result {
                Ok(response) => match self.config.classifier().classify(&response) {
                    Verdict::Accept => {
                        debug!(
                            "attempt {}/{} accepted: {}",
                            attempt,
                            max_attempts,
                            response.status_line()
                        );
                        return Ok(response);
                    }
                    Verdict::Retry(reason) => AttemptError::Rejected {
                        status: response.status(),
                        reason,
                    },
                },
                Err(e) => match e.cancellation() {
                    Some(cancellation) => return Err(RetryError::Cancelled(cancellation)),
                    None => AttemptError::Transport(e),
                },
            };

            if attempt >= max_attempts {
                debug!("giving up after {} attempts: {}", max_attempts, error);
                return Err(RetryError::Exhausted {
                    attempts: max_attempts,
                    last: error,
                });
            }

            let delay = self.config.backoff().delay(attempt);
            warn!(
                "attempt {}/{} failed ({}), retrying in {:?}...",
                attempt, max_attempts, error, delay
            );

            tokio::select! {
                biased;
                cancellation = request.cancelled() => return Err(RetryError::Cancelled(cancellation)),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
