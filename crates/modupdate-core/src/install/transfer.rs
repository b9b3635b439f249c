use crate::errors::{Result, UpdateError};
use crate::install::backup::move_file;
use crate::net::Remote;
use anyhow::Context;
use modupdate_meta::MetadataReader;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Fetch `url` into a scratch file. Failures are tagged with the URL.
pub fn download(remote: &dyn Remote, url: &str, dest: &Path) -> Result<u64> {
    tracing::info!(url, dest = %dest.display(), "downloading");
    remote.download(url, dest).map_err(|e| match e {
        UpdateError::Transfer { .. } => e,
        other => UpdateError::Transfer {
            target: url.to_string(),
            detail: other.to_string(),
        },
    })
}

/// Replace `live` with the contents of `temp`. The bytes land in a sibling
/// staging file first and are renamed over `live`, so `live` is either the
/// old file or the complete new one.
pub fn promote(temp: &Path, live: &Path) -> Result<()> {
    if let Some(parent) = live.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(live);
    let res = fs::copy(temp, &staging)
        .with_context(|| format!("stage {}", staging.display()))
        .and_then(|_| {
            fs::rename(&staging, live)
                .with_context(|| format!("replace {}", live.display()))
        });

    if let Err(e) = res {
        let _ = fs::remove_file(&staging);
        return Err(UpdateError::Transfer {
            target: live.display().to_string(),
            detail: format!("{e:#}"),
        });
    }
    Ok(())
}

/// Put a moved-away backup (and whatever travels with it) back at the live
/// path after a failed promotion.
pub fn restore(reader: &dyn MetadataReader, backup: &Path, live: &Path) -> Result<()> {
    let companions = reader.companions(backup, live);
    move_file(backup, live)?;
    for (from, to) in companions {
        move_file(&from, &to)?;
    }
    Ok(())
}

fn staging_path(live: &Path) -> PathBuf {
    let mut name = live.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    live.with_file_name(name)
}

/// Scratch directory for one pass. Cleared by `prepare`, removed on drop so
/// every exit path cleans up.
pub struct TempArea {
    root: PathBuf,
}

impl TempArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory, or empty it if a previous pass left files behind.
    pub fn prepare(&self) -> Result<()> {
        if !self.root.is_dir() {
            tracing::info!(dir = %self.root.display(), "creating temporary directory");
            fs::create_dir_all(&self.root)?;
            return Ok(());
        }

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl Drop for TempArea {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => tracing::info!("removed all temporary files"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(dir = %self.root.display(), "could not remove temporary directory: {e}"),
        }
    }
}
