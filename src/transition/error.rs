//! Errors surfaced by the transition pipeline.

use super::rejection::{Rejection, RejectionKind};
use thiserror::Error;

/// Convenient result alias for the transition pipeline.
pub type TransitionResult<T> = std::result::Result<T, TransitionError>;

/// Everything that can end a transition unsuccessfully.
///
/// `Rejected` carries the value-based outcomes (superseded, invalid,
/// ignored, aborted); the remaining variants are faults.
#[derive(Debug, Clone, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Hook failed: {message}")]
    HookFailed { message: String },

    #[error("Failed to resolve '{name}': {message}")]
    ResolveFailed { name: String, message: String },

    #[error("Unknown dependency '{name}'")]
    UnknownDependency { name: String },

    #[error("Circular dependency on '{name}'")]
    CircularDependency { name: String },

    #[error("Dependency '{name}' is not resolved yet")]
    Unresolved { name: String },

    #[error("Transition was dropped before it settled")]
    Dropped,

    #[error("Too many consecutive redirects ({limit})")]
    TooManyRedirects { limit: usize },
}

impl TransitionError {
    /// Fault raised from inside a hook body.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::HookFailed {
            message: message.into(),
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        self.rejection().map(Rejection::kind)
    }

    /// True for rejections, false for faults.
    pub fn is_rejection(&self) -> bool {
        self.rejection().is_some()
    }

    pub fn is_redirect(&self) -> bool {
        self.rejection().is_some_and(Rejection::is_redirected)
    }
}
