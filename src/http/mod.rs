//! Retrying HTTP client: executor, classification, backoff and transport.

mod backoff;
mod classify;
mod client;
mod error;
mod request;
mod response;
mod transport;

pub use backoff::{BACKOFF_UNIT, Backoff, JitteredBackoff, MAX_JITTER_MS, NoBackoff};
pub use classify::{Classify, StatusClassifier, Verdict, is_retryable_status};
pub use client::{Client, ClientBuilder, DEFAULT_ATTEMPTS, RetryConfig};
pub use error::{AttemptError, Cancellation, ConfigError, RetryError, TransportError};
pub use request::Request;
pub use response::Response;
pub use transport::{DEFAULT_TIMEOUT, ReqwestTransport, Transport};
