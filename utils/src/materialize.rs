//! Scoped materialization of embedded script text.
//!
//! Scripts compiled into the binary have to exist on disk before an external
//! runtime can load them. [`materialize`] writes the text to a uniquely named
//! temp file and returns a [`MaterializedScript`] that owns it. The file lives
//! exactly as long as the handle: dropping it removes the file, on every exit
//! path including a constructor that fails after materializing.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Keep the permissions the temp file was created with (owner read/write on Unix).
    Default,
    /// Owner read-only (0o400 on Unix). The runtime only ever reads the script.
    #[default]
    OwnerReadOnly,
}

impl PersistMode {
    #[cfg(unix)]
    pub fn mode(self) -> Option<u32> {
        match self {
            Self::Default => None,
            Self::OwnerReadOnly => Some(0o400),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    /// Directory to create the file in. `None` uses the system temp dir.
    pub dir: Option<PathBuf>,
    /// Permission policy for the created file.
    pub mode: PersistMode,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            dir: None,
            mode: PersistMode::OwnerReadOnly,
        }
    }
}

impl MaterializeOptions {
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }
}

/// A script written to disk for the lifetime of this handle.
///
/// The path is stable and read-only after creation, so it can be shared by
/// reference between concurrent callers without locking.
#[derive(Debug)]
pub struct MaterializedScript {
    name: String,
    content: Cow<'static, str>,
    path: TempPath,
}

impl MaterializedScript {
    /// Logical name the script was materialized under (e.g. `renderer.js`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original text the file was written from.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `content` to a new temp file named after `name`.
///
/// `renderer.js` becomes something like `/tmp/renderer-a1B2c3.js`: the stem is
/// kept as a prefix and the extension as a suffix so runtimes that dispatch on
/// file extension still recognize it.
pub fn materialize(
    name: &str,
    content: impl Into<Cow<'static, str>>,
    options: &MaterializeOptions,
) -> io::Result<MaterializedScript> {
    let content = content.into();
    let (prefix, suffix) = temp_affixes(name);

    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(&suffix);
    let mut tmp = match &options.dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;

    #[cfg(unix)]
    if let Some(mode) = options.mode.mode() {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = options.mode;

    let path = tmp.into_temp_path();
    debug!(name, path = %path.display(), bytes = content.len(), "Materialized script");

    Ok(MaterializedScript {
        name: name.to_string(),
        content,
        path,
    })
}

fn temp_affixes(name: &str) -> (String, String) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("script");
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (format!("{stem}-"), suffix)
}
