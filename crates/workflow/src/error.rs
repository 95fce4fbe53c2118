use thiserror::Error;

/// Failure taxonomy for pipeline nodes. A node converts any internal
/// failure into one of these and records it on the state; nothing is
/// thrown across node boundaries.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("context fetch failed: {0}")]
    ContextFetch(String),

    #[error("reasoning service failed: {0}")]
    Reasoning(String),

    #[error("normalization failed: {0}")]
    Normalization(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Recorded but never fatal: a missing acknowledgment must not keep
    /// the user from getting an answer.
    #[error("acknowledgment failed: {0}")]
    Acknowledgment(String),
}
