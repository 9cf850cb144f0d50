//! Response classification: decides whether a response ends the retry loop.

use reqwest::StatusCode;

use super::response::Response;

/// Outcome of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The response is final and is returned to the caller.
    Accept,
    /// The response signals a transient condition; try again.
    Retry(String),
}

/// Decides whether a response should be retried.
pub trait Classify: Send + Sync {
    fn classify(&self, response: &Response) -> Verdict;
}

impl<F> Classify for F
where
    F: Fn(&Response) -> Verdict + Send + Sync,
{
    fn classify(&self, response: &Response) -> Verdict {
        self(response)
    }
}

/// Default classifier: retries 408, 429 and every 5xx status.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl Classify for StatusClassifier {
    fn classify(&self, response: &Response) -> Verdict {
        if is_retryable_status(response.status()) {
            Verdict::Retry(format!("invalid status: {}", response.status_line()))
        } else {
            Verdict::Accept
        }
    }
}

/// Returns true for statuses that indicate a transient condition.
///
/// Other 4xx client errors point at a defect in the request itself and are
/// final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => true,
        s => s.is_server_error(),
    }
}
