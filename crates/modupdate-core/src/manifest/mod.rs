pub mod github;

use crate::errors::{Result, UpdateError};
use crate::net::Remote;
use crate::types::UpdaterManifest;

pub use github::{classify_asset, fetch_latest_release, AssetClassifier, AssetKind, SkipArchives};

/// Fetch and parse `updater.json`. Every failure (transport, status, JSON,
/// missing `Version`) is reported as `ManifestUnavailable`.
pub fn fetch_manifest(remote: &dyn Remote, url: &str) -> Result<UpdaterManifest> {
    let unavailable = |detail: String| UpdateError::ManifestUnavailable {
        url: url.to_string(),
        detail,
    };

    let txt = remote.get_text(url).map_err(|e| unavailable(e.to_string()))?;
    parse_manifest(&txt).map_err(|e| unavailable(e.to_string()))
}

pub fn parse_manifest(txt: &str) -> Result<UpdaterManifest> {
    let m: UpdaterManifest = serde_json::from_str(txt)?;
    if m.version.trim().is_empty() {
        return Err(UpdateError::Msg("manifest has an empty Version".into()));
    }
    Ok(m)
}
