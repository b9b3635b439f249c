use crate::config::UpdaterConfig;
use crate::errors::{Result, UpdateError};
use crate::net::download::download_to_path;
use anyhow::Context;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use std::path::Path;
use std::time::Duration;

/// Sent with every request: manifests and release listings must never come from a cache.
static NO_CACHE_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut h = HeaderMap::new();
    h.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, private"),
    );
    h.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    h
});

/// The network as the updater sees it. `UpdaterClient` is the real thing;
/// tests swap in an in-memory map.
pub trait Remote {
    /// GET `url` and return the body as text. Non-success statuses are errors.
    fn get_text(&self, url: &str) -> Result<String>;

    /// GET `url` and stream the body into `dest`, overwriting it.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Blocking HTTPS client shared by one update pass. Dropping it releases the
/// connection pool.
pub struct UpdaterClient {
    http: Client,
}

impl UpdaterClient {
    pub fn new(cfg: &UpdaterConfig) -> Result<Self> {
        // zero disables the timeout, including reqwest's blocking default
        let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
        let builder = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .default_headers(NO_CACHE_HEADERS.clone())
            .timeout(timeout);
        Ok(Self {
            http: builder.build()?,
        })
    }
}

impl Remote for UpdaterClient {
    fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;
        if !resp.status().is_success() {
            return Err(UpdateError::Msg(format!("GET {url}: {}", resp.status())));
        }
        Ok(resp.text()?)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        download_to_path(&self.http, url, dest)
    }
}
