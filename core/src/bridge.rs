//! Render bridge: the public surface for turning MJML into HTML.
//!
//! Construction IS initialization. `start()` materializes the embedded
//! renderer and completes a warmup render before returning, so holding a
//! `RenderBridge` is proof the renderer loads and answers. No two-phase init,
//! no `ready` flag.

use std::path::{Path, PathBuf};

use futures_util::future::{AbortRegistration, Abortable};
use mjml_types::{RenderDefaults, RenderInput, RenderOptions, RenderResponse};
use mjml_utils::{MaterializeOptions, MaterializedScript};

use crate::assets;
use crate::error::BridgeError;
use crate::invoker::{InvokeError, Invoker};

/// Minify stays off until a minifier is bundled with the renderer again.
const MINIFY: bool = false;

/// Smallest document the renderer accepts; used to force the script to load.
const WARMUP_VIEW: &str = "<mjml></mjml>";

/// Construction-time configuration for a [`RenderBridge`].
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Defaults applied to every render call.
    pub defaults: RenderDefaults,
    /// Name of the embedded renderer script.
    pub resource: String,
    /// Where to materialize the script. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            defaults: RenderDefaults::default(),
            resource: assets::RENDERER_SCRIPT.to_string(),
            scratch_dir: None,
        }
    }
}

impl BridgeOptions {
    #[must_use]
    pub fn with_defaults(defaults: RenderDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }
}

/// Owns one materialized renderer script and the invoker that runs it.
///
/// All render methods take `&self`; share the bridge (e.g. behind an `Arc`)
/// to render from many tasks at once. Calls are independent: no ordering,
/// no retries, no caching of outputs.
pub struct RenderBridge<I> {
    invoker: I,
    script: MaterializedScript,
    defaults: RenderDefaults,
    options: RenderOptions,
}

impl<I: Invoker> RenderBridge<I> {
    /// Materialize the renderer and warm it up.
    ///
    /// Fails if the embedded script is missing, cannot be written, or the
    /// warmup render fails. On failure the invoker is disposed and the
    /// materialized file removed before the error is returned.
    pub async fn start(invoker: I, options: BridgeOptions) -> Result<Self, BridgeError> {
        let script = match materialize_renderer(&options) {
            Ok(script) => script,
            Err(e) => {
                invoker.dispose().await;
                return Err(e);
            }
        };

        let bridge = Self {
            invoker,
            script,
            defaults: options.defaults,
            options: RenderOptions::from_defaults(options.defaults, MINIFY),
        };

        if let Err(e) = bridge.warmup().await {
            bridge.shutdown().await;
            return Err(e);
        }

        tracing::debug!(
            script = %bridge.script.path().display(),
            keep_comments = bridge.defaults.keep_comments,
            beautify = bridge.defaults.beautify,
            "Render bridge ready"
        );
        Ok(bridge)
    }

    /// Render raw MJML markup. The text is passed through unchanged.
    pub async fn render(&self, view: &str) -> Result<RenderResponse, BridgeError> {
        self.render_input(view).await
    }

    /// Parse `json` into an MJML JSON tree, then render it.
    ///
    /// Malformed JSON fails with [`BridgeError::Parse`] before the invoker is called.
    pub async fn render_json(&self, json: &str) -> Result<RenderResponse, BridgeError> {
        let tree: serde_json::Value = serde_json::from_str(json).map_err(BridgeError::Parse)?;
        self.render_input(RenderInput::Tree(tree)).await
    }

    /// Render markup or a tree without a cancellation handle.
    pub async fn render_input(
        &self,
        view: impl Into<RenderInput>,
    ) -> Result<RenderResponse, BridgeError> {
        self.invoke_renderer(view.into()).await
    }

    /// Render markup or a tree, abandoning the call if the paired
    /// [`AbortHandle`](futures_util::future::AbortHandle) is aborted first.
    ///
    /// Aborting only affects this call; the bridge stays usable.
    pub async fn render_with_cancel(
        &self,
        view: impl Into<RenderInput>,
        cancel: AbortRegistration,
    ) -> Result<RenderResponse, BridgeError> {
        match Abortable::new(self.invoke_renderer(view.into()), cancel).await {
            Ok(result) => result,
            Err(_aborted) => {
                tracing::debug!("Render cancelled by caller");
                Err(BridgeError::Cancelled)
            }
        }
    }

    /// Path of the materialized renderer every call is made against.
    #[must_use]
    pub fn script_path(&self) -> &Path {
        self.script.path()
    }

    #[must_use]
    pub fn defaults(&self) -> RenderDefaults {
        self.defaults
    }

    /// Options delivered to the renderer on every call.
    #[must_use]
    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Dispose the invoker, then remove the materialized script. Consumes self.
    pub async fn shutdown(self) {
        self.invoker.dispose().await;
        tracing::debug!(script = %self.script.path().display(), "Render bridge shut down");
    }

    async fn warmup(&self) -> Result<(), BridgeError> {
        self.render(WARMUP_VIEW).await.map(|_| ())
    }

    async fn invoke_renderer(&self, view: RenderInput) -> Result<RenderResponse, BridgeError> {
        let options = serde_json::to_value(self.options).map_err(|e| InvokeError::Protocol {
            message: format!("serializing render options: {e}"),
        })?;
        let args = vec![view.into_value(), options];

        let raw = self.invoker.invoke(self.script.path(), args).await?;

        serde_json::from_value(raw).map_err(|e| {
            BridgeError::Invocation(InvokeError::Protocol {
                message: format!("unexpected render response: {e}"),
            })
        })
    }
}

fn materialize_renderer(options: &BridgeOptions) -> Result<MaterializedScript, BridgeError> {
    let content =
        assets::embedded(&options.resource).ok_or_else(|| BridgeError::ResourceNotFound {
            name: options.resource.clone(),
        })?;

    let materialize_options = MaterializeOptions {
        dir: options.scratch_dir.clone(),
        ..MaterializeOptions::default()
    };
    mjml_utils::materialize(&options.resource, content, &materialize_options).map_err(|source| {
        BridgeError::Materialization {
            name: options.resource.clone(),
            source,
        }
    })
}
