//! Error types for the agent core.
//!
//! Nothing here is fatal: every variant is recoverable by re-prompting the
//! user, retrying on the next poll cycle, or waiting for the next grant
//! attempt.

use thiserror::Error;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur in the agent core.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed local input; re-prompt, no state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// The server returned non-2xx, an unparseable body, or a negative
    /// verdict; user-visible, no state change.
    #[error("server error: {0}")]
    Server(String),

    /// Network unreachable or timed out; retried on the next cycle.
    #[error("transport error: {0}")]
    Transport(String),

    /// A required OS capability is not granted.
    #[error("capability unavailable: {0}")]
    Capability(String),

    /// Durable store failure.
    #[error(transparent)]
    Storage(#[from] wardlink_store::StoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
