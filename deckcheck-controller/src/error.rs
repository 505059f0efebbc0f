//! Error types for the job controller

use deckcheck_core::domain::job::{FailureKind, JobFailure};
use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced to the caller of a controller operation
///
/// Apart from `Superseded`, every variant corresponds to a transition into
/// `Failed` carrying the same message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// The upload was rejected before any request was sent
    #[error("{0}")]
    Validation(String),

    /// The request could not be completed
    #[error("{0}")]
    Transport(String),

    /// The server rejected the request or reported a failed analysis
    #[error("{0}")]
    Server(String),

    /// A newer submission or a reset replaced this one while it was in flight
    #[error("Submission was superseded before the server responded")]
    Superseded,
}

impl From<&JobFailure> for ControllerError {
    fn from(failure: &JobFailure) -> Self {
        let message = failure.message.clone();
        match failure.kind {
            FailureKind::Validation => Self::Validation(message),
            FailureKind::Transport => Self::Transport(message),
            FailureKind::Server => Self::Server(message),
        }
    }
}
