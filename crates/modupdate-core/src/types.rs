use crate::errors::{SkipReason, UpdateError};
use crate::source::UpdateSource;
use modupdate_meta::PluginMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A plugin binary found in the mods directory that declares an update source.
#[derive(Debug, Clone)]
pub struct InstalledItem {
    pub path: PathBuf,
    pub file_name: String,
    pub version: String,
    pub type_name: String,
    pub namespace: String,
    pub name: String,
    pub author: String,
    pub source: UpdateSource,
}

impl InstalledItem {
    /// The metadata this item carries once replaced by `version`.
    pub fn metadata_at(&self, version: &str) -> PluginMetadata {
        PluginMetadata {
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            version: version.to_string(),
            author: self.author.clone(),
            download_link: Some(self.source.key.clone()),
        }
    }
}

/// `updater.json` published next to a self-hosted plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdaterManifest {
    pub version: String,
    #[serde(default)]
    pub remote_relative_path: Option<String>,
    #[serde(default)]
    pub update_notes: Option<String>,
    #[serde(default)]
    pub store_backup: bool,
    #[serde(default, alias = "DependencyEntries")]
    pub dependencies: Vec<DependencySpec>,
}

/// A file some plugin needs next to it (shared library, data file, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DependencySpec {
    pub filename: String,
    /// Absolute URL, or a fragment resolved against the plugin's source.
    #[serde(rename = "RemoteFullPath", alias = "RemoteURL")]
    pub remote: String,
    /// Directory relative to the install root.
    pub local_path: String,
    #[serde(default)]
    pub force_update: bool,
}

/// One downloadable file attached to a GitHub release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// What happened to the previous binary before promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupAction {
    /// No prior backup existed; the live file was moved into the backup dir.
    Moved,
    /// The older backup was replaced with the outgoing version.
    Overwritten,
    /// The existing backup is newer than the outgoing version and was kept.
    Kept,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Updated {
        from: String,
        to: String,
        backup: Option<BackupAction>,
    },
    UpToDate {
        installed: String,
        latest: String,
    },
    Skipped {
        reason: SkipReason,
        message: String,
    },
}

impl ItemOutcome {
    pub fn skipped(err: &UpdateError) -> Self {
        ItemOutcome::Skipped {
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub file_name: String,
    /// Grouping key (the declared URL), when one was readable.
    pub source: Option<String>,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependencyOutcome {
    Installed,
    Present,
    Failed { reason: SkipReason, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub file_name: String,
    pub destination: PathBuf,
    /// Plugin whose manifest asked for it.
    pub required_by: String,
    pub outcome: DependencyOutcome,
}

/// Result of one orchestration pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub items: Vec<ItemReport>,
    pub dependencies: Vec<DependencyReport>,
}

impl UpdateReport {
    pub fn item(&self, file_name: &str) -> Option<&ItemReport> {
        self.items.iter().find(|r| r.file_name == file_name)
    }

    pub fn updated(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Skipped { .. }))
    }
}
