//! fdx-store
//!
//! Durable JSON snapshot stores for the harvester.
//!
//! - [`DiscoveryStore`]: interval fetch records + best-known entity records.
//! - [`TrafficCache`]: per-system visit counters from the enrichment phase.
//!
//! Persistence is whole-snapshot overwrite. Each write goes to a sibling temp
//! file which is then renamed over the target, so a reader never observes a
//! half-written snapshot. There is no file locking: one writer per store file.

mod discovery;
mod traffic;

pub use discovery::DiscoveryStore;
pub use traffic::TrafficCache;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// Reading, writing, or renaming the snapshot failed.
    Io { path: PathBuf, message: String },
    /// The file exists but does not hold a usable snapshot.
    Corrupt { path: PathBuf, message: String },
    /// The snapshot was written by a newer layout version.
    UnsupportedVersion { path: PathBuf, found: u32 },
    /// In-memory state could not be serialized.
    Serialize(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, message } => {
                write!(f, "store io error at '{}': {message}", path.display())
            }
            StoreError::Corrupt { path, message } => {
                write!(f, "STORE_CORRUPT '{}': {message}", path.display())
            }
            StoreError::UnsupportedVersion { path, found } => write!(
                f,
                "STORE_UNSUPPORTED_VERSION '{}': found version {found}, supported <= {}",
                path.display(),
                fdx_schemas::STORE_VERSION
            ),
            StoreError::Serialize(msg) => write!(f, "store serialize error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Shared file helpers
// ---------------------------------------------------------------------------

/// Read a snapshot file. `Ok(None)` when the file does not exist or holds
/// only whitespace.
pub(crate) fn read_snapshot(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(s) if s.trim().is_empty() => Ok(None),
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io {
            path: path.to_path_buf(),
            message: format!("read failed: {e}"),
        }),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub(crate) fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))?;

    let io_err = |message: String| StoreError::Io {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(format!("create parent dir failed: {e}")))?;
    }

    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, format!("{json}\n")).map_err(|e| io_err(format!("write temp failed: {e}")))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_err(format!("rename over target failed: {e}")));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
