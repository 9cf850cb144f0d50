//! Error types produced by the retrying client.

use reqwest::StatusCode;
use std::fmt;

/// Why a request stopped before the attempt budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// The request's cancellation token fired.
    Cancelled,
    /// The request's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cancellation::Cancelled => write!(f, "request cancelled"),
            Cancellation::DeadlineExceeded => write!(f, "request deadline exceeded"),
        }
    }
}

/// Failure of a single transport call.
#[derive(Debug)]
pub enum TransportError {
    /// The HTTP stack failed (connect, DNS, TLS, timeout, body read).
    Http(reqwest::Error),
    /// An I/O failure outside of reqwest, mostly from custom transports.
    Io(std::io::Error),
    /// The caller cancelled the request.
    Cancelled,
    /// The request's deadline passed while the call was in flight.
    DeadlineExceeded,
}

impl TransportError {
    /// Returns the cancellation this error represents, if any.
    /// Cancellations are never retried.
    pub fn cancellation(&self) -> Option<Cancellation> {
        match self {
            TransportError::Cancelled => Some(Cancellation::Cancelled),
            TransportError::DeadlineExceeded => Some(Cancellation::DeadlineExceeded),
            _ => None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Http(e) => write!(f, "{}", e),
            TransportError::Io(e) => write!(f, "{}", e),
            TransportError::Cancelled => write!(f, "{}", Cancellation::Cancelled),
            TransportError::DeadlineExceeded => write!(f, "{}", Cancellation::DeadlineExceeded),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Http(e) => Some(e),
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

/// Why one attempt did not produce an accepted response.
#[derive(Debug)]
pub enum AttemptError {
    /// The transport call itself failed.
    Transport(TransportError),
    /// A response arrived but the classifier asked for another attempt.
    Rejected { status: StatusCode, reason: String },
}

impl AttemptError {
    /// Status of the rejected response, if the attempt got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AttemptError::Rejected { status, .. } => Some(*status),
            AttemptError::Transport(_) => None,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Transport(e) => write!(f, "{}", e),
            AttemptError::Rejected { reason, .. } => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Transport(e) => Some(e),
            AttemptError::Rejected { .. } => None,
        }
    }
}

/// Terminal error returned by [`Client::execute`](super::Client::execute).
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed; carries the budget and the last cause.
    Exhausted { attempts: u32, last: AttemptError },
    /// The caller gave up on the request.
    Cancelled(Cancellation),
}

impl RetryError {
    /// The last attempt's failure, for exhausted requests.
    pub fn last_attempt(&self) -> Option<&AttemptError> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "after {} attempts: {}", attempts, last)
            }
            RetryError::Cancelled(c) => write!(f, "{}", c),
        }
    }
}

impl std::error::Error for RetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled(_) => None,
        }
    }
}

/// Invalid client construction options.
#[derive(Debug)]
pub enum ConfigError {
    /// `max_attempts` must be at least 1.
    InvalidAttempts(u32),
    /// The per-call timeout must be non-zero.
    InvalidTimeout,
    /// The underlying reqwest client could not be built.
    Transport(reqwest::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAttempts(n) => {
                write!(f, "invalid max attempts: {} (must be at least 1)", n)
            }
            ConfigError::InvalidTimeout => write!(f, "invalid timeout: must be greater than zero"),
            ConfigError::Transport(e) => write!(f, "failed to build HTTP transport: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Transport(e) => Some(e),
            ConfigError::InvalidAttempts(_) | ConfigError::InvalidTimeout => None,
        }
    }
}
