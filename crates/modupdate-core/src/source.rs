//! Update sources and the textual URL rules built on top of them.

use crate::config::UpdaterConfig;
use crate::errors::{Result, UpdateError};
use reqwest::Url;

const GITHUB_PREFIX: &str = "https://github.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `https://github.com/{owner}/{repo}...`
    GitHub { owner: String, repo: String },
    /// Any other HTTP(S) base; manifests live at `{base}/{namespace}/updater.json`.
    Http { base: String },
}

/// Where a plugin's updates come from. `key` is the URL exactly as declared
/// and is what plugins are grouped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSource {
    pub key: String,
    pub kind: SourceKind,
}

impl UpdateSource {
    /// Validate a declared download link. Only absolute http/https URLs with
    /// a host are accepted.
    pub fn parse(link: &str) -> Result<Self> {
        let key = link.trim();
        let url = Url::parse(key).map_err(|_| UpdateError::MalformedSource(link.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(UpdateError::MalformedSource(link.to_string()));
        }

        let kind = match github_parts(key) {
            Some((owner, repo)) => SourceKind::GitHub { owner, repo },
            None => SourceKind::Http {
                base: key.trim_end_matches('/').to_string(),
            },
        };

        Ok(Self {
            key: key.to_string(),
            kind,
        })
    }

    pub fn is_github(&self) -> bool {
        matches!(self.kind, SourceKind::GitHub { .. })
    }

    /// GitHub repos map onto raw.githubusercontent; anything else is
    /// `{base}/{namespace}/{sub_path}`.
    pub fn format_url(&self, cfg: &UpdaterConfig, namespace: &str, sub_path: &str) -> String {
        let sub_path = sub_path.trim_start_matches('/');
        match &self.kind {
            SourceKind::GitHub { owner, repo } => format!(
                "{}/{owner}/{repo}/{}/{namespace}/{sub_path}",
                cfg.raw_base.trim_end_matches('/'),
                cfg.raw_branch
            ),
            SourceKind::Http { base } => format!("{base}/{namespace}/{sub_path}"),
        }
    }

    pub fn manifest_url(&self, cfg: &UpdaterConfig, namespace: &str) -> String {
        self.format_url(cfg, namespace, "updater.json")
    }

    /// `GET /repos/{owner}/{repo}/releases/latest`; `None` for plain HTTP sources.
    pub fn latest_release_url(&self, cfg: &UpdaterConfig) -> Option<String> {
        match &self.kind {
            SourceKind::GitHub { owner, repo } => Some(format!(
                "{}/repos/{owner}/{repo}/releases/latest",
                cfg.github_api.trim_end_matches('/')
            )),
            SourceKind::Http { .. } => None,
        }
    }
}

/// Slash-split `https://github.com/{owner}/{repo}`; anything shorter or with
/// empty segments is not a repository URL.
fn github_parts(link: &str) -> Option<(String, String)> {
    if !link.starts_with(GITHUB_PREFIX) {
        return None;
    }
    let mut segs = link.split('/').skip(3);
    let owner = segs.next().filter(|s| !s.is_empty())?;
    let repo = segs.next().filter(|s| !s.is_empty())?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
