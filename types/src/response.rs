//! Renderer output types.

use serde::{Deserialize, Serialize};

/// Result of a single render, returned verbatim from the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
    /// Validation problems reported by the renderer. A non-empty list does not
    /// mean `html` is empty; mjml renders what it can.
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl RenderResponse {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// A single validation problem, in the shape mjml reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default)]
    pub line: Option<u32>,
    pub message: String,
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub formatted_message: Option<String>,
}

impl ErrorDetail {
    /// Human-readable one-liner, preferring the renderer's own formatting.
    #[must_use]
    pub fn display_line(&self) -> String {
        if let Some(formatted) = self
            .formatted_message
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            return formatted.to_string();
        }
        match (self.line, self.tag_name.as_deref()) {
            (Some(line), Some(tag)) => format!("Line {line} of <{tag}>: {}", self.message),
            (Some(line), None) => format!("Line {line}: {}", self.message),
            (None, Some(tag)) => format!("<{tag}>: {}", self.message),
            (None, None) => self.message.clone(),
        }
    }
}
