//! Invocation facility contract.
//!
//! The bridge never talks to a script runtime directly. It goes through an
//! [`Invoker`]: something that can load a script by path and call its entry
//! point with positional JSON arguments. Any runtime meeting this shape is
//! interchangeable, and tests substitute an in-memory fake.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

/// Invocation future type alias.
pub type InvokeFut<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, InvokeError>> + Send + 'a>>;

/// Disposal future type alias.
pub type DisposeFut<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Asynchronous call-by-path-and-arguments into a script runtime.
///
/// Implementations must be safe to call concurrently from many tasks.
///
/// Cancellation is by drop: when the caller stops polling an [`InvokeFut`]
/// the call is abandoned, and implementations must release any per-call
/// state (pending request slots, timers) at that point.
pub trait Invoker: Send + Sync {
    /// Load `script` (once, implementation-cached) and call its entry point with `args`.
    fn invoke<'a>(&'a self, script: &'a Path, args: Vec<serde_json::Value>) -> InvokeFut<'a>;

    /// Release the runtime. Calls made after disposal fail with [`InvokeError::Disposed`].
    fn dispose(&self) -> DisposeFut<'_>;
}

/// Error types for script invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Failed to start script host: {message}")]
    Spawn { message: String },
    #[error("Script host exited: {message}")]
    HostExited { message: String },
    #[error("Script raised an error: {message}")]
    Script {
        message: String,
        stack: Option<String>,
    },
    #[error("Invocation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
    #[error("Malformed response: {message}")]
    Protocol { message: String },
    #[error("Invoker has been disposed")]
    Disposed,
}

impl InvokeError {
    /// Diagnostic payload the runtime supplied, if any (e.g. a script stack trace).
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Script { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}
