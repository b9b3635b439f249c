use crate::errors::{Result, UpdateError};
use anyhow::Context;
use reqwest::blocking::Client;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Stream `url` into `dest`, replacing whatever was there. Returns bytes written.
pub fn download_to_path(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    let mut resp = client
        .get(url)
        .send()
        .with_context(|| format!("GET {url}"))?;
    if !resp.status().is_success() {
        return Err(UpdateError::Transfer {
            target: url.to_string(),
            detail: format!("download failed: {}", resp.status()),
        });
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = fs::File::create(dest)?;
    let mut buf = [0u8; 128 * 1024];
    let mut written = 0u64;

    loop {
        let n = resp.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        written += n as u64;
    }
    out.flush()?;

    Ok(written)
}
