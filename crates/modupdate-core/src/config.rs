use crate::errors::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
const TEMP_SUBDIR: &str = "modupdate";

/// Everything one update pass needs to know about the local layout and the
/// remote endpoints. Optional directories fall back to `<mods>/backup`,
/// `<mods>/temp` and the parent of `<mods>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Left empty when a config file only sets endpoints; the CLI fills it in.
    #[serde(default)]
    pub mods_dir: PathBuf,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Root that dependency `LocalPath`s are resolved against.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
    #[serde(default = "default_extension")]
    pub binary_extension: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_github_api")]
    pub github_api: String,
    #[serde(default = "default_raw_base")]
    pub raw_base: String,
    #[serde(default = "default_raw_branch")]
    pub raw_branch: String,
}

fn default_extension() -> String {
    "dll".into()
}
fn default_user_agent() -> String {
    "ModUpdater".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_github_api() -> String {
    DEFAULT_GITHUB_API.into()
}
fn default_raw_base() -> String {
    DEFAULT_RAW_BASE.into()
}
fn default_raw_branch() -> String {
    "main".into()
}

impl UpdaterConfig {
    pub fn new(mods_dir: impl Into<PathBuf>) -> Self {
        Self {
            mods_dir: mods_dir.into(),
            backup_dir: None,
            temp_dir: None,
            install_dir: None,
            binary_extension: default_extension(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            github_api: default_github_api(),
            raw_base: default_raw_base(),
            raw_branch: default_raw_branch(),
        }
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: UpdaterConfig = serde_json::from_str(&txt)
            .with_context(|| format!("invalid config JSON in {}", path.display()))?;
        Ok(cfg)
    }

    pub fn backup_root(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.mods_dir.join("backup"))
    }

    /// A configured temp dir may be shared (`/tmp`), so the pass only ever
    /// purges and removes its own `modupdate` subdirectory inside it.
    pub fn temp_root(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) => dir.join(TEMP_SUBDIR),
            None => self.mods_dir.join("temp"),
        }
    }

    pub fn install_root(&self) -> PathBuf {
        self.install_dir.clone().unwrap_or_else(|| {
            self.mods_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.mods_dir.clone())
        })
    }
}
