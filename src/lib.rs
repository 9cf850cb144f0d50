//! Retrying HTTP client.
//!
//! [`http::Client`] sends a [`http::Request`] through a [`http::Transport`],
//! retries transient failures with a jittered backoff, and stops early when
//! the request is cancelled. [`requests::RequestBuilder`] assembles requests.

pub mod http;
pub mod requests;
