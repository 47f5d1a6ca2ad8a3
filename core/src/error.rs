//! Errors surfaced by the render bridge.

use std::io;

use crate::invoker::InvokeError;

/// Everything that can go wrong constructing a bridge or rendering through it.
///
/// Construction-time variants (`ResourceNotFound`, `Materialization`, and a
/// failed warmup's `Invocation`) mean no bridge was returned at all.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Embedded resource not found: {name}")]
    ResourceNotFound { name: String },
    #[error("Failed to materialize {name}")]
    Materialization {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON input")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Invocation(#[from] InvokeError),
    #[error("Render cancelled")]
    Cancelled,
}

impl BridgeError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
