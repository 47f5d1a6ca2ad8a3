//! `NodeInvoker`: the [`Invoker`] implementation backed by Node.js.
//!
//! The host process is started lazily on the first call and restarted on the
//! next call after it dies. Running state lives in the slot: `Idle` before
//! the first call, `Running` while a host exists, `Disposed` forever after
//! `dispose()`.

use std::path::Path;

use mjml_core::{DisposeFut, InvokeError, InvokeFut, Invoker};
use mjml_utils::{MaterializeOptions, MaterializedScript};
use tokio::sync::Mutex;

use crate::host::{HostChannel, RunningHost};
use crate::types::NodeConfig;

/// Name the embedded host script is materialized under.
pub const HOST_SCRIPT: &str = "mjml-host.js";

const HOST_SCRIPT_RAW: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/host.js"));

enum HostSlot {
    Idle,
    Running(RunningHost),
    Disposed,
}

/// Runs scripts in a long-lived Node.js process.
///
/// Safe to share between tasks: concurrent calls are multiplexed over one
/// host process by request id.
pub struct NodeInvoker {
    config: NodeConfig,
    host_script: MaterializedScript,
    slot: Mutex<HostSlot>,
}

impl NodeInvoker {
    /// Materialize the host script into the system temp dir.
    ///
    /// Does not start Node; that happens on the first invocation.
    pub fn new(config: NodeConfig) -> Result<Self, InvokeError> {
        Self::with_materialize_options(config, &MaterializeOptions::default())
    }

    pub fn with_materialize_options(
        config: NodeConfig,
        options: &MaterializeOptions,
    ) -> Result<Self, InvokeError> {
        let host_script = mjml_utils::materialize(HOST_SCRIPT, HOST_SCRIPT_RAW, options).map_err(
            |e| InvokeError::Spawn {
                message: format!("materializing {HOST_SCRIPT}: {e}"),
            },
        )?;
        Ok(Self {
            config,
            host_script,
            slot: Mutex::new(HostSlot::Idle),
        })
    }

    /// Path of the materialized host script passed to `node`.
    #[must_use]
    pub fn host_script(&self) -> &Path {
        self.host_script.path()
    }

    /// Whether a live host process currently exists.
    pub async fn is_running(&self) -> bool {
        matches!(&*self.slot.lock().await, HostSlot::Running(host) if host.is_alive())
    }

    async fn channel(&self) -> Result<HostChannel, InvokeError> {
        let mut slot = self.slot.lock().await;
        match &*slot {
            HostSlot::Disposed => return Err(InvokeError::Disposed),
            HostSlot::Running(host) if host.is_alive() => return Ok(host.channel()),
            HostSlot::Running(_) => tracing::info!("Script host is gone, restarting"),
            HostSlot::Idle => {}
        }

        let host = RunningHost::start(&self.config, self.host_script.path()).map_err(|e| {
            InvokeError::Spawn {
                message: format!("{e:#}"),
            }
        })?;
        let channel = host.channel();
        *slot = HostSlot::Running(host);
        Ok(channel)
    }

    async fn call(
        &self,
        script: &Path,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, InvokeError> {
        let channel = self.channel().await?;
        tracing::debug!(script = %script.display(), args = args.len(), "Invoking script");
        channel
            .request(script, args, self.config.invocation_timeout())
            .await
    }

    async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock().await, HostSlot::Disposed);
        if let HostSlot::Running(host) = previous {
            tracing::info!("Shutting down script host...");
            host.shutdown().await;
        }
    }
}

impl Invoker for NodeInvoker {
    fn invoke<'a>(&'a self, script: &'a Path, args: Vec<serde_json::Value>) -> InvokeFut<'a> {
        Box::pin(self.call(script, args))
    }

    fn dispose(&self) -> DisposeFut<'_> {
        Box::pin(self.shutdown())
    }
}
