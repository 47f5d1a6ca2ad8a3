//! Host handle: owns the Node.js child process and multiplexes calls over its stdio.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use mjml_core::InvokeError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::codec::{FrameReader, FrameWriter};
use crate::protocol::{self, InvocationRequest};
use crate::types::NodeConfig;

const SHUTDOWN_TIMEOUT_SECS: u64 = 2;

const WRITER_CHANNEL_CAPACITY: usize = 64;

type PendingMap = Mutex<HashMap<u64, oneshot::Sender<serde_json::Value>>>;

pub(crate) enum WriterCommand {
    Send(serde_json::Value),
    Shutdown,
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<serde_json::Value>>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Route a response frame to the call waiting on its id.
fn dispatch_frame(frame: serde_json::Value, pending: &PendingMap) {
    let Some(id) = protocol::response_id(&frame) else {
        tracing::trace!("Ignoring script host frame without a numeric id");
        return;
    };
    let sender = lock(pending).remove(&id);
    match sender {
        Some(tx) => {
            let _ = tx.send(frame);
        }
        None => {
            // Timed out or cancelled callers have already removed their slot.
            tracing::trace!(id, "Dropping response for abandoned request");
        }
    }
}

/// Mark the host dead and fail every in-flight call.
///
/// `alive` flips before the map is drained so a caller that registers after
/// the drain still sees the host as dead.
fn close_pending(alive: &AtomicBool, pending: &PendingMap) {
    alive.store(false, Ordering::SeqCst);
    let drained = std::mem::take(&mut *lock(pending));
    if !drained.is_empty() {
        tracing::debug!(count = drained.len(), "Failing in-flight script calls");
    }
}

/// Removes a pending entry when the owning call finishes, times out, or is dropped.
struct PendingSlot<'a> {
    pending: &'a PendingMap,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.id);
    }
}

/// Cloneable handle for issuing calls to a running host.
#[derive(Clone)]
pub(crate) struct HostChannel {
    writer_tx: mpsc::Sender<WriterCommand>,
    pending: Arc<PendingMap>,
    next_id: Arc<AtomicU64>,
    alive: Arc<AtomicBool>,
}

impl HostChannel {
    fn new(writer_tx: mpsc::Sender<WriterCommand>) -> Self {
        Self {
            writer_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Send one invocation and wait for its response.
    pub async fn request(
        &self,
        script: &Path,
        args: Vec<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, InvokeError> {
        if !self.is_alive() {
            return Err(host_exited("script host is not running"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_value(InvocationRequest::new(id, script, &args)).map_err(
            |e| InvokeError::Protocol {
                message: format!("serializing request: {e}"),
            },
        )?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            id,
        };
        if !self.is_alive() {
            return Err(host_exited("script host is not running"));
        }

        if self
            .writer_tx
            .send(WriterCommand::Send(frame))
            .await
            .is_err()
        {
            return Err(host_exited("writer channel closed"));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(frame)) => protocol::parse_response(frame),
            Ok(Err(_)) => Err(host_exited("script host exited before responding")),
            Err(_) => Err(InvokeError::Timeout { elapsed: timeout }),
        }
    }
}

fn host_exited(message: &str) -> InvokeError {
    InvokeError::HostExited {
        message: message.to_string(),
    }
}

pub(crate) struct RunningHost {
    child: Child,
    channel: HostChannel,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    stderr_handle: JoinHandle<()>,
}

impl RunningHost {
    /// Spawn `node <args> <host_script>` and wire up its stdio tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &NodeConfig, host_script: &Path) -> Result<Self> {
        let resolved_cmd = which::which(config.command())
            .with_context(|| format!("{} not found in PATH", config.command()))?;
        let mut cmd = Command::new(&resolved_cmd);
        cmd.args(config.args())
            .arg(host_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !config.node_path().is_empty() {
            let joined =
                std::env::join_paths(config.node_path()).context("joining NODE_PATH entries")?;
            cmd.env("NODE_PATH", joined);
        }
        cmd.envs(config.env());
        if let Some(dir) = config.working_dir() {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", resolved_cmd.display()))?;
        let pid = child.id();

        let stdin = child.stdin.take().context("no stdin from script host")?;
        let stdout = child.stdout.take().context("no stdout from script host")?;
        let stderr = child.stderr.take().context("no stderr from script host")?;

        let (writer_tx, mut writer_rx) = mpsc::channel::<WriterCommand>(WRITER_CHANNEL_CAPACITY);
        let channel = HostChannel::new(writer_tx);

        let writer_handle = tokio::spawn(async move {
            let mut writer = FrameWriter::new(stdin);
            while let Some(cmd) = writer_rx.recv().await {
                match cmd {
                    WriterCommand::Send(frame) => {
                        if let Err(e) = writer.write_frame(&frame).await {
                            tracing::warn!("Script host write error: {e:#}");
                            break;
                        }
                    }
                    WriterCommand::Shutdown => break,
                }
            }
        });

        let reader_pending = Arc::clone(&channel.pending);
        let reader_alive = Arc::clone(&channel.alive);
        let reader_handle = tokio::spawn(async move {
            let mut reader = FrameReader::new(stdout);
            loop {
                match reader.read_frame().await {
                    Ok(Some(frame)) => dispatch_frame(frame, &reader_pending),
                    Ok(None) => {
                        tracing::info!(pid, "Script host closed stdout");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(pid, "Script host reader error: {e:#}");
                        break;
                    }
                }
            }
            close_pending(&reader_alive, &reader_pending);
        });

        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!(pid, "node: {line}");
            }
        });

        tracing::info!(
            pid,
            command = %resolved_cmd.display(),
            "Script host started"
        );

        Ok(Self {
            child,
            channel,
            reader_handle,
            writer_handle,
            stderr_handle,
        })
    }

    pub fn channel(&self) -> HostChannel {
        self.channel.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.channel.is_alive()
    }

    /// Close the host's stdin and wait for it to exit, killing it if it lingers.
    pub async fn shutdown(mut self) {
        let _ = self.channel.writer_tx.send(WriterCommand::Shutdown).await;

        match tokio::time::timeout(
            Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
            self.child.wait(),
        )
        .await
        {
            Ok(Ok(status)) => tracing::debug!(%status, "Script host exited"),
            Ok(Err(e)) => tracing::warn!("Failed waiting for script host: {e}"),
            Err(_) => {
                tracing::debug!("Script host didn't exit in time, killing");
                let _ = self.child.kill().await;
            }
        }

        close_pending(&self.channel.alive, &self.channel.pending);
    }
}

impl Drop for RunningHost {
    fn drop(&mut self) {
        // Child has kill_on_drop(true); the tasks would otherwise linger on closed pipes.
        self.writer_handle.abort();
        self.reader_handle.abort();
        self.stderr_handle.abort();
    }
}
