use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{0}")]
    Msg(String),

    #[error("could not read plugin metadata from {path}: {detail}")]
    MetadataUnreadable { path: PathBuf, detail: String },

    #[error("no update source declared")]
    NoUpdateSource,

    #[error("invalid update source URL {0:?}")]
    MalformedSource(String),

    #[error("updater not found at {url}: {detail}")]
    ManifestUnavailable { url: String, detail: String },

    #[error("invalid version format {0:?}")]
    InvalidVersion(String),

    #[error("no release asset named {0}")]
    NoMatchingAsset(String),

    #[error("transfer failed for {target}: {detail}")]
    Transfer { target: String, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Net(#[from] reqwest::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Metadata error: {0}")]
    Meta(#[from] modupdate_meta::MetaError),
}

impl From<anyhow::Error> for UpdateError {
    fn from(e: anyhow::Error) -> Self {
        UpdateError::Msg(format!("{e:#}"))
    }
}

impl UpdateError {
    /// Which per-item skip category this error lands in.
    /// Anything raised while moving bytes around counts as a transfer failure.
    pub fn reason(&self) -> SkipReason {
        match self {
            UpdateError::MetadataUnreadable { .. } | UpdateError::Meta(_) => {
                SkipReason::MetadataUnreadable
            }
            UpdateError::NoUpdateSource => SkipReason::NoUpdateSource,
            UpdateError::MalformedSource(_) => SkipReason::MalformedSource,
            UpdateError::ManifestUnavailable { .. } | UpdateError::Serde(_) => {
                SkipReason::ManifestUnavailable
            }
            UpdateError::InvalidVersion(_) => SkipReason::InvalidVersion,
            UpdateError::NoMatchingAsset(_) => SkipReason::NoMatchingAsset,
            UpdateError::Msg(_)
            | UpdateError::Transfer { .. }
            | UpdateError::Io(_)
            | UpdateError::Net(_) => SkipReason::TransferFailed,
        }
    }
}

/// Why an item (or dependency) was left alone during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MetadataUnreadable,
    NoUpdateSource,
    MalformedSource,
    ManifestUnavailable,
    InvalidVersion,
    NoMatchingAsset,
    TransferFailed,
}

impl SkipReason {
    /// Expected situations are informational; the rest deserve a warning.
    pub fn is_warning(self) -> bool {
        !matches!(
            self,
            SkipReason::NoUpdateSource
                | SkipReason::ManifestUnavailable
                | SkipReason::NoMatchingAsset
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MetadataUnreadable => "metadata unreadable",
            SkipReason::NoUpdateSource => "no update source",
            SkipReason::MalformedSource => "malformed update source",
            SkipReason::ManifestUnavailable => "updater not found",
            SkipReason::InvalidVersion => "invalid version",
            SkipReason::NoMatchingAsset => "no matching release asset",
            SkipReason::TransferFailed => "transfer failed",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
