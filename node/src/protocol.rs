//! Wire messages exchanged with the script host.

use std::path::Path;

use mjml_core::InvokeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct InvocationRequest<'a> {
    pub id: u64,
    pub script: &'a Path,
    pub args: &'a [serde_json::Value],
}

impl<'a> InvocationRequest<'a> {
    pub fn new(id: u64, script: &'a Path, args: &'a [serde_json::Value]) -> Self {
        Self { id, script, args }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InvocationResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ScriptFailure>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScriptFailure {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

impl InvocationResponse {
    /// An `error` member wins over `result`; a missing result is JSON `null`.
    pub fn into_result(self) -> Result<serde_json::Value, InvokeError> {
        match self.error {
            Some(failure) => Err(InvokeError::Script {
                message: failure.message,
                stack: failure.stack,
            }),
            None => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Request id a response frame answers, if it has one.
pub(crate) fn response_id(frame: &serde_json::Value) -> Option<u64> {
    frame.get("id")?.as_u64()
}

pub(crate) fn parse_response(frame: serde_json::Value) -> Result<serde_json::Value, InvokeError> {
    serde_json::from_value::<InvocationResponse>(frame)
        .map_err(|e| InvokeError::Protocol {
            message: format!("invalid host response: {e}"),
        })?
        .into_result()
}
