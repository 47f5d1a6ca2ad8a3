//! Render bridge for mjml-bridge.
//!
//! This crate owns the embedded MJML renderer script and the [`RenderBridge`]
//! that deploys, warms, and repeatedly invokes it through an [`Invoker`].
//! It knows nothing about how scripts are actually executed; `mjml-node`
//! provides the Node.js-backed invoker.

pub mod assets;
mod bridge;
mod error;
pub mod invoker;

pub use bridge::{BridgeOptions, RenderBridge};
pub use error::BridgeError;
pub use futures_util::future::{AbortHandle, AbortRegistration};
pub use invoker::{DisposeFut, InvokeError, InvokeFut, Invoker};
pub use mjml_types::{ErrorDetail, RenderDefaults, RenderInput, RenderOptions, RenderResponse};
