//! Public configuration for the Node.js script host.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use mjml_utils::expand_env_vars;
use serde::Deserialize;

const DEFAULT_COMMAND: &str = "node";

const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeConfigError {
    #[error("node command must not be empty")]
    EmptyCommand,
    #[error("invocation_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNodeConfig {
    #[serde(default = "default_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    node_path: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    working_dir: Option<String>,
    #[serde(default = "default_timeout_secs")]
    invocation_timeout_secs: u64,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_INVOCATION_TIMEOUT_SECS
}

/// Validated script host configuration.
///
/// Invariant: `command` is non-empty and the timeout is non-zero (enforced
/// via `#[serde(try_from)]` at the deserialization boundary). `${VAR}`
/// references in `node_path`, `env` values and `working_dir` are expanded
/// there as well.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNodeConfig")]
pub struct NodeConfig {
    command: String,
    args: Vec<String>,
    node_path: Vec<PathBuf>,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    invocation_timeout: Duration,
}

impl TryFrom<RawNodeConfig> for NodeConfig {
    type Error = NodeConfigError;

    fn try_from(raw: RawNodeConfig) -> Result<Self, Self::Error> {
        let mut config = Self::new(raw.command)?
            .with_args(raw.args)
            .with_invocation_timeout(Duration::from_secs(raw.invocation_timeout_secs))?;
        config.node_path = raw
            .node_path
            .iter()
            .map(|p| PathBuf::from(expand_env_vars(p)))
            .collect();
        config.env = raw
            .env
            .into_iter()
            .map(|(k, v)| (k, expand_env_vars(&v)))
            .collect();
        config.working_dir = raw
            .working_dir
            .as_deref()
            .map(|dir| PathBuf::from(expand_env_vars(dir)));
        Ok(config)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            args: Vec::new(),
            node_path: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            invocation_timeout: Duration::from_secs(DEFAULT_INVOCATION_TIMEOUT_SECS),
        }
    }
}

impl NodeConfig {
    pub fn new(command: impl Into<String>) -> Result<Self, NodeConfigError> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(NodeConfigError::EmptyCommand);
        }
        Ok(Self {
            command,
            ..Self::default()
        })
    }

    /// Extra arguments placed before the host script path (e.g. `--max-old-space-size=512`).
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Directories joined into `NODE_PATH` so the renderer can `require('mjml')`.
    #[must_use]
    pub fn with_node_path(mut self, node_path: Vec<PathBuf>) -> Self {
        self.node_path = node_path;
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Result<Self, NodeConfigError> {
        if timeout.is_zero() {
            return Err(NodeConfigError::ZeroTimeout);
        }
        self.invocation_timeout = timeout;
        Ok(self)
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn node_path(&self) -> &[PathBuf] {
        &self.node_path
    }

    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// How long a single invocation may take before it fails with a timeout.
    #[must_use]
    pub fn invocation_timeout(&self) -> Duration {
        self.invocation_timeout
    }
}
