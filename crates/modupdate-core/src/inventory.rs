//! Local scan: which plugin binaries exist and what they declare.

use crate::errors::{Result, UpdateError};
use crate::paths::has_extension;
use crate::source::UpdateSource;
use crate::types::InstalledItem;
use anyhow::Context;
use modupdate_meta::MetadataReader;
use std::fs;
use std::path::{Path, PathBuf};

/// `<mods>/*.<ext>`, sorted by file name. Subdirectories (backup, temp) are
/// not descended into. An unreadable mods directory is fatal to the pass.
pub fn scan_mods_dir(mods_dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(mods_dir).with_context(|| format!("read mods dir {}", mods_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, ext) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read one binary's metadata and validate its update source.
pub fn read_item(reader: &dyn MetadataReader, path: &Path) -> Result<InstalledItem> {
    let meta = match reader.read(path) {
        Ok(Some(meta)) => meta,
        Ok(None) => {
            return Err(UpdateError::MetadataUnreadable {
                path: path.to_path_buf(),
                detail: "no metadata block".into(),
            })
        }
        Err(e) => {
            return Err(UpdateError::MetadataUnreadable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
        }
    };

    let link = meta
        .download_link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(UpdateError::NoUpdateSource)?;
    let source = UpdateSource::parse(link)?;

    Ok(InstalledItem {
        path: path.to_path_buf(),
        file_name: file_name_of(path),
        namespace: meta.namespace().to_string(),
        type_name: meta.type_name,
        version: meta.version,
        name: meta.name,
        author: meta.author,
        source,
    })
}
