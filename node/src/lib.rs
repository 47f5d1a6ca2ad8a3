//! Node.js script host for `mjml-bridge`.
//!
//! A single long-lived `node` process runs an embedded host script that
//! loads renderer scripts on demand and answers invocation requests over
//! stdio, framed with `Content-Length` headers. [`NodeInvoker`] owns that
//! process and implements [`mjml_core::Invoker`] on top of it.

pub mod codec;
mod host;
mod invoker;
pub(crate) mod protocol;
pub mod types;

pub use invoker::{HOST_SCRIPT, NodeInvoker};
pub use types::{NodeConfig, NodeConfigError};
