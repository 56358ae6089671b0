//! Rollout error types.
//!
//! Execution errors are fatal to the in-progress update: nothing is
//! retried here and partial progress is never rolled back. The group
//! record reflects exactly the batches completed so far.

use thiserror::Error;

/// Result type alias for rollout operations.
pub type RolloutResult<T> = Result<T, RolloutError>;

/// Errors that can occur while planning or executing a group update.
#[derive(Debug, Error)]
pub enum RolloutError {
    /// Definition validation failed before the update could proceed.
    #[error(transparent)]
    Validation(#[from] strato_core::ValidationError),

    /// The pause overhead of the plan alone exceeds the stack's
    /// remaining timeout; rejected before any mutation. The message is
    /// preserved verbatim for operator visibility.
    #[error("The current UpdatePolicy will result in stack update timeout.")]
    UpdateTimeout,

    #[error("member creation failed for group {group}: {source}")]
    CreateFailed {
        group: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("member {member} failed to become active: {source}")]
    ActivationFailed {
        member: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to destroy member {member}: {source}")]
    DestroyFailed {
        member: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to resize member {member}: {source}")]
    ResizeFailed {
        member: String,
        #[source]
        source: anyhow::Error,
    },

    /// A member never reported the resize-pending state within the
    /// polling budget. Treated as fatal; there is no fallback to full
    /// replacement.
    #[error("member {member} stuck in resize after {attempts} status polls")]
    ResizeStuck { member: String, attempts: u32 },

    #[error("load balancer reload failed for group {group}: {source}")]
    ReloadFailed {
        group: String,
        #[source]
        source: anyhow::Error,
    },

    /// The surrounding stack update was cancelled or timed out; the
    /// executor aborted at the next suspension point.
    #[error("group update cancelled by stack shutdown signal")]
    Cancelled,

    #[error("state store error: {0}")]
    State(#[from] strato_state::StateError),
}
