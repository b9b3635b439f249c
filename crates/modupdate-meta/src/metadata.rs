//! Plugin metadata record and the reader contract.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What a plugin binary declares about itself.
/// Four fields are required; `download_link` is the optional update source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Fully qualified entry type, e.g. "BetterChat.Plugin".
    pub type_name: String,
    /// Display name (e.g. "Better Chat").
    pub name: String,
    /// Dotted version string (e.g. "1.4.2").
    pub version: String,
    pub author: String,
    /// Where updates are published: an HTTP base or a GitHub repository URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

impl PluginMetadata {
    /// Top-level segment of `type_name`, used to build per-plugin sub-paths.
    pub fn namespace(&self) -> &str {
        self.type_name.split('.').next().unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("metadata digest mismatch in {path} (got {got}, want {want})")]
    Digest {
        path: PathBuf,
        got: String,
        want: String,
    },

    #[error("metadata block in {path} is truncated or oversized ({len} bytes)")]
    BadLength { path: PathBuf, len: u64 },
}

pub type Result<T> = std::result::Result<T, MetaError>;

/// A metadata strategy registers one of these with the updater.
/// `Ok(None)` means the file carries no metadata block at all.
pub trait MetadataReader: Send + Sync {
    fn read(&self, file: &Path) -> Result<Option<PluginMetadata>>;

    /// Files kept next to `file` that must follow it when it is moved or
    /// copied to `dest`, as `(current path, path beside dest)` pairs. Only
    /// pairs whose source exists are returned.
    fn companions(&self, _file: &Path, _dest: &Path) -> Vec<(PathBuf, PathBuf)> {
        Vec::new()
    }

    /// Persist `meta` for a binary that was just replaced. A no-op when the
    /// metadata lives inside the binary.
    fn record(&self, _file: &Path, _meta: &PluginMetadata) -> Result<()> {
        Ok(())
    }
}

impl<R: MetadataReader + ?Sized> MetadataReader for Box<R> {
    fn read(&self, file: &Path) -> Result<Option<PluginMetadata>> {
        (**self).read(file)
    }

    fn companions(&self, file: &Path, dest: &Path) -> Vec<(PathBuf, PathBuf)> {
        (**self).companions(file, dest)
    }

    fn record(&self, file: &Path, meta: &PluginMetadata) -> Result<()> {
        (**self).record(file, meta)
    }
}
