//! Core render types for mjml-bridge.
//!
//! This crate contains pure data types with no IO, no async, and minimal dependencies.
//! They describe what goes into the renderer ([`RenderInput`], [`RenderOptions`]) and
//! what comes back out ([`RenderResponse`]).

mod response;

pub use response::{ErrorDetail, RenderResponse};

use serde::{Deserialize, Serialize};

// ============================================================================
// Render Input
// ============================================================================

/// The document handed to the renderer.
///
/// Either raw MJML markup or an already-parsed JSON tree. The bridge enforces
/// no schema on the tree; the renderer validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderInput {
    Markup(String),
    Tree(serde_json::Value),
}

impl RenderInput {
    /// Convert into the JSON value sent over the wire.
    #[must_use]
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Markup(text) => serde_json::Value::String(text),
            Self::Tree(tree) => tree,
        }
    }
}

impl From<&str> for RenderInput {
    fn from(value: &str) -> Self {
        Self::Markup(value.to_string())
    }
}

impl From<String> for RenderInput {
    fn from(value: String) -> Self {
        Self::Markup(value)
    }
}

impl From<serde_json::Value> for RenderInput {
    fn from(value: serde_json::Value) -> Self {
        Self::Tree(value)
    }
}

// ============================================================================
// Render Options
// ============================================================================

/// Host-wide defaults applied to every render call.
///
/// Supplied once at bridge construction. There is no per-call override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDefaults {
    pub keep_comments: bool,
    pub beautify: bool,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            keep_comments: true,
            beautify: true,
        }
    }
}

/// Options object delivered to the renderer as its second argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub keep_comments: bool,
    pub beautify: bool,
    pub minify: bool,
}

impl RenderOptions {
    /// Build the options for a render call from host defaults.
    #[must_use]
    pub fn from_defaults(defaults: RenderDefaults, minify: bool) -> Self {
        Self {
            keep_comments: defaults.keep_comments,
            beautify: defaults.beautify,
            minify,
        }
    }
}
