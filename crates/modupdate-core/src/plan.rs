//! Grouping by update source and the per-item / per-dependency decisions.

use crate::config::UpdaterConfig;
use crate::errors::{Result, UpdateError};
use crate::paths::is_contained;
use crate::source::UpdateSource;
use crate::types::{InstalledItem, ReleaseAsset, UpdaterManifest};
use crate::version::is_newer;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Items that share one declared update URL.
#[derive(Debug, Clone)]
pub struct SourceGroup {
    pub source: UpdateSource,
    pub items: Vec<InstalledItem>,
}

/// Group by source key, keeping first-seen order of both groups and items.
pub fn group_by_source(items: Vec<InstalledItem>) -> IndexMap<String, SourceGroup> {
    let mut groups: IndexMap<String, SourceGroup> = IndexMap::new();
    for item in items {
        groups
            .entry(item.source.key.clone())
            .or_insert_with(|| SourceGroup {
                source: item.source.clone(),
                items: Vec::new(),
            })
            .items
            .push(item);
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub url: String,
    pub version: String,
    pub store_backup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPlan {
    UpToDate { installed: String, latest: String },
    Update(PlannedUpdate),
}

/// Decide what to do with `item` given its source's manifest.
pub fn plan_manifest_item(
    cfg: &UpdaterConfig,
    item: &InstalledItem,
    manifest: &UpdaterManifest,
) -> Result<ItemPlan> {
    if !is_newer(&manifest.version, &item.version)? {
        return Ok(ItemPlan::UpToDate {
            installed: item.version.clone(),
            latest: manifest.version.clone(),
        });
    }

    let sub_path = match manifest
        .remote_relative_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        Some(dir) if dir.ends_with('/') => format!("{dir}{}", item.file_name),
        Some(path) => path.to_string(),
        None => format!("bin/{}", item.file_name),
    };

    Ok(ItemPlan::Update(PlannedUpdate {
        url: item.source.format_url(cfg, &item.namespace, &sub_path),
        version: manifest.version.clone(),
        store_backup: manifest.store_backup,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFetch {
    pub url: String,
    pub destination: PathBuf,
    pub forced: bool,
}

#[derive(Debug)]
pub enum DependencyAction {
    Fetch(DependencyFetch),
    /// Already on disk and not forced.
    Present,
    Rejected(UpdateError),
}

#[derive(Debug)]
pub struct DependencyPlan {
    pub file_name: String,
    pub destination: PathBuf,
    pub action: DependencyAction,
}

/// One plan per manifest dependency: fetch when the file is missing or
/// `ForceUpdate` is set; reject destinations that would escape the install root.
pub fn plan_dependencies(
    cfg: &UpdaterConfig,
    item: &InstalledItem,
    manifest: &UpdaterManifest,
) -> Vec<DependencyPlan> {
    let root = cfg.install_root();

    manifest
        .dependencies
        .iter()
        .map(|dep| {
            let local = Path::new(&dep.local_path);
            let name = Path::new(&dep.filename);
            let destination = root.join(local).join(name);

            let single_name = name.components().count() == 1 && is_contained(name);
            if !single_name || !is_contained(local) {
                return DependencyPlan {
                    file_name: dep.filename.clone(),
                    destination,
                    action: DependencyAction::Rejected(UpdateError::Transfer {
                        target: dep.filename.clone(),
                        detail: format!("unsafe local path {:?}", dep.local_path),
                    }),
                };
            }

            let action = if destination.exists() && !dep.force_update {
                DependencyAction::Present
            } else {
                DependencyAction::Fetch(DependencyFetch {
                    url: dependency_url(cfg, item, &dep.remote),
                    destination: destination.clone(),
                    forced: dep.force_update,
                })
            };

            DependencyPlan {
                file_name: dep.filename.clone(),
                destination,
                action,
            }
        })
        .collect()
}

fn dependency_url(cfg: &UpdaterConfig, item: &InstalledItem, remote: &str) -> String {
    let remote = remote.trim();
    if remote.starts_with("http://") || remote.starts_with("https://") {
        remote.to_string()
    } else {
        item.source.format_url(cfg, &item.namespace, remote)
    }
}

/// First asset whose name equals `file_name` ignoring case. Later duplicates
/// are reported and ignored.
pub fn match_asset<'a>(assets: &[&'a ReleaseAsset], file_name: &str) -> Option<&'a ReleaseAsset> {
    let mut matches = assets
        .iter()
        .copied()
        .filter(|a| a.name.eq_ignore_ascii_case(file_name));
    let first = matches.next()?;
    for dup in matches {
        tracing::warn!(
            file = file_name,
            chosen = %first.browser_download_url,
            ignored = %dup.browser_download_url,
            "several release assets match; using the first"
        );
    }
    Some(first)
}
