//! GitHub "latest release" resolution.

use crate::errors::{Result, UpdateError};
use crate::net::Remote;
use crate::paths::has_extension;
use crate::types::{InstalledItem, ReleaseAsset};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: Option<String>,
    assets: Vec<ReleaseAsset>,
}

/// Query the latest release and return its assets.
pub fn fetch_latest_release(remote: &dyn Remote, url: &str) -> Result<Vec<ReleaseAsset>> {
    let unavailable = |detail: String| UpdateError::ManifestUnavailable {
        url: url.to_string(),
        detail,
    };

    let txt = remote.get_text(url).map_err(|e| unavailable(e.to_string()))?;
    let release: LatestRelease =
        serde_json::from_str(&txt).map_err(|e| unavailable(e.to_string()))?;

    tracing::debug!(
        url,
        tag = release.tag_name.as_deref().unwrap_or("?"),
        assets = release.assets.len(),
        "latest release resolved"
    );
    Ok(release.assets)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Direct replacement candidate for an installed plugin.
    Binary,
    /// Packaged archive; handed to an `AssetClassifier`.
    Archive,
    Other,
}

pub fn classify_asset(name: &str, binary_ext: &str) -> AssetKind {
    let p = Path::new(name);
    if has_extension(p, "zip") {
        AssetKind::Archive
    } else if has_extension(p, binary_ext) {
        AssetKind::Binary
    } else {
        AssetKind::Other
    }
}

/// Hook for archive assets. What lives inside a release archive is host
/// specific, so the updater only reports them.
pub trait AssetClassifier {
    fn archive(&self, asset: &ReleaseAsset, items: &[InstalledItem]);
}

/// Default: log and move on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipArchives;

impl AssetClassifier for SkipArchives {
    fn archive(&self, asset: &ReleaseAsset, _items: &[InstalledItem]) {
        tracing::info!(asset = %asset.name, "skipping archive asset");
    }
}
