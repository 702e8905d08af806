//! Error types for the progress, assessment, and alert services.
//!
//! `CoreError` is the domain taxonomy surfaced to callers. `StoreError` is the
//! opaque infrastructure failure reported by a persistence adapter; it is kept
//! separate so request layers can map it to a server error instead of a
//! client error.

use thiserror::Error;

/// Errors returned by the core services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced module, assessment, alert, or learner does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The operation is not allowed from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Every attempt slot for the assessment has been used.
    #[error("no attempts left for assessment {assessment_id} ({used}/{max} used)")]
    AttemptsExhausted {
        assessment_id: String,
        used: u32,
        max: u32,
    },

    /// The actor is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The persistence adapter failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns `true` if the failure was caused by the caller's request rather
    /// than by the infrastructure. Client errors are deterministic and must not
    /// be retried without a change of state.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Store(_))
    }

    /// Returns `true` for the "no attempts left" condition.
    pub fn is_attempts_exhausted(&self) -> bool {
        matches!(self, CoreError::AttemptsExhausted { .. })
    }
}

/// Failures reported by a persistence adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backing store holds data it cannot interpret.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CoreError::not_found("module", "m1").is_client_error());
        assert!(CoreError::InvalidState("done".into()).is_client_error());
        let exhausted = CoreError::AttemptsExhausted {
            assessment_id: "a1".into(),
            used: 3,
            max: 3,
        };
        assert!(exhausted.is_client_error());
        assert!(exhausted.is_attempts_exhausted());

        let store: CoreError = StoreError::Unavailable("connection reset".into()).into();
        assert!(!store.is_client_error());
        assert!(!store.is_attempts_exhausted());
    }

    #[test]
    fn messages() {
        assert_eq!(
            CoreError::not_found("module", "fire-101").to_string(),
            "module not found: fire-101"
        );
        let exhausted = CoreError::AttemptsExhausted {
            assessment_id: "quake-quiz".into(),
            used: 2,
            max: 2,
        };
        assert_eq!(
            exhausted.to_string(),
            "no attempts left for assessment quake-quiz (2/2 used)"
        );
    }
}
