//! In-memory network and stamped-binary helpers for unit tests.

use crate::errors::{Result, UpdateError};
use crate::net::Remote;
use modupdate_meta::{write_stamped, PluginMetadata};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct FakeRemote {
    bodies: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_bytes(url, body.as_bytes().to_vec())
    }

    pub fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn hits(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }

    fn lookup(&self, url: &str) -> Result<&Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        self.bodies
            .get(url)
            .ok_or_else(|| UpdateError::Msg(format!("GET {url}: 404 Not Found")))
    }
}

impl Remote for FakeRemote {
    fn get_text(&self, url: &str) -> Result<String> {
        let body = self.lookup(url)?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let body = self.lookup(url)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, body)?;
        Ok(body.len() as u64)
    }
}

pub fn meta(file_name: &str, version: &str, link: Option<&str>) -> PluginMetadata {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    PluginMetadata {
        type_name: format!("{stem}.Main"),
        name: stem.to_string(),
        version: version.to_string(),
        author: "tester".to_string(),
        download_link: link.map(str::to_string),
    }
}

/// Write `dir/file_name` with `payload` and a metadata trailer.
pub fn stamped(
    dir: &Path,
    file_name: &str,
    payload: &[u8],
    version: &str,
    link: Option<&str>,
) -> PathBuf {
    let p = dir.join(file_name);
    write_stamped(&p, payload, &meta(file_name, version, link)).unwrap();
    p
}

/// Bytes of a stamped binary, for serving from a fake or mock server.
pub fn stamped_bytes(file_name: &str, payload: &[u8], version: &str) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let p = stamped(dir.path(), file_name, payload, version, None);
    fs::read(p).unwrap()
}
