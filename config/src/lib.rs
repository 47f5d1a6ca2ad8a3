//! Configuration file for `mjml-bridge`.
//!
//! ```toml
//! scratch_dir = "${XDG_RUNTIME_DIR}/mjml"
//!
//! [render]
//! keep_comments = false
//! beautify = true
//!
//! [node]
//! command = "node"
//! node_path = ["/srv/mail/node_modules"]
//! invocation_timeout_secs = 30
//! ```
//!
//! Every section is optional. A missing file means "use the defaults".

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mjml_core::{BridgeOptions, RenderDefaults};
use mjml_node::NodeConfig;
use mjml_utils::{MaterializeOptions, expand_env_vars};
use serde::Deserialize;

/// Overrides [`config_path`] when set.
pub const CONFIG_ENV: &str = "MJML_BRIDGE_CONFIG";

// bool::default() is false, so only true needs a fn
const fn default_true() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub node: NodeConfig,
    /// Where renderer and host scripts are materialized. System temp dir when unset.
    #[serde(default, deserialize_with = "expanded_path")]
    pub scratch_dir: Option<PathBuf>,
}

/// Render defaults applied to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub keep_comments: bool,
    #[serde(default = "default_true")]
    pub beautify: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            keep_comments: true,
            beautify: true,
        }
    }
}

impl From<RenderConfig> for RenderDefaults {
    fn from(config: RenderConfig) -> Self {
        RenderDefaults {
            keep_comments: config.keep_comments,
            beautify: config.beautify,
        }
    }
}

fn expanded_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|dir| PathBuf::from(expand_env_vars(&dir))))
}

impl BridgeConfig {
    /// Load from [`config_path`]. `Ok(None)` when there is no config file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match Self::parse(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn render_defaults(&self) -> RenderDefaults {
        self.render.into()
    }

    #[must_use]
    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            scratch_dir: self.scratch_dir.clone(),
            ..BridgeOptions::with_defaults(self.render_defaults())
        }
    }

    /// Materialization settings for the Node host script.
    #[must_use]
    pub fn materialize_options(&self) -> MaterializeOptions {
        match &self.scratch_dir {
            Some(dir) => MaterializeOptions::in_dir(dir),
            None => MaterializeOptions::default(),
        }
    }
}

/// `$MJML_BRIDGE_CONFIG` if set, otherwise `~/.mjml-bridge/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_ENV), dirs::home_dir())
}

fn resolve_config_path(overridden: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match overridden {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => home.map(|home| home.join(".mjml-bridge").join("config.toml")),
    }
}
