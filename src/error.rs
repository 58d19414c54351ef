//! Error types for a3s-buzz

use crate::fault::Fault;
use crate::kind::{FaultKind, CANCELLED, PANIC};
use thiserror::Error;

/// Errors returned by every buzz operation
///
/// Only the `Fault` variant is a domain fault. The other variants signal
/// caller misconfiguration and are never classified or absorbed by
/// `handle_errors`.
#[derive(Debug, Error)]
pub enum BuzzError {
    /// A raised domain fault
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The requested fault kind could not be constructed
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// A message template could not be rendered
    #[error("Failed to format message template '{template}': {reason}")]
    Format {
        template: String,
        reason: String,
    },
}

/// Failure of the default construction convention or of a custom builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to construct fault of kind '{kind}': {reason}")]
pub struct ConstructionError {
    /// Name of the kind that was requested
    pub kind: String,

    /// Why construction failed
    pub reason: String,
}

impl ConstructionError {
    /// Create a construction error for the given kind
    pub fn new(kind: &FaultKind, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl BuzzError {
    /// The domain fault, if this error is one
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            BuzzError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Consume the error, returning the domain fault if it is one
    pub fn into_fault(self) -> Option<Fault> {
        match self {
            BuzzError::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Covers-test against the fault kind; false for non-fault errors
    pub fn is_kind_of(&self, kind: &FaultKind) -> bool {
        self.as_fault().is_some_and(|f| f.is_kind_of(kind))
    }
}

impl From<std::io::Error> for BuzzError {
    fn from(err: std::io::Error) -> Self {
        BuzzError::Fault(Fault::from(err))
    }
}

impl From<tokio::task::JoinError> for BuzzError {
    fn from(err: tokio::task::JoinError) -> Self {
        let kind = if err.is_cancelled() { &CANCELLED } else { &PANIC };
        BuzzError::Fault(Fault::new(kind, err.to_string()))
    }
}

/// Result type alias for buzz operations
pub type Result<T> = std::result::Result<T, BuzzError>;
