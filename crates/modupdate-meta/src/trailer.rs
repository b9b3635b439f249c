//! Fixed-layout metadata footer appended to a plugin binary.
//!
//! Layout, from the end of the file backwards:
//! `payload | json | sha256(json) [32] | json_len u32 LE [4] | MAGIC [8]`
//!
//! The footer is found by seeking to `len - FOOTER_LEN`; nothing is scanned.

use crate::metadata::{MetaError, MetadataReader, PluginMetadata, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const MAGIC: &[u8; 8] = b"MODMETA\x01";

const DIGEST_LEN: u64 = 32;
const FOOTER_LEN: u64 = DIGEST_LEN + 4 + MAGIC.len() as u64;
const MAX_JSON_LEN: u64 = 64 * 1024;

/// Default reader: metadata travels inside the binary, so a freshly
/// downloaded copy can be inspected before it replaces anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailerReader;

impl MetadataReader for TrailerReader {
    fn read(&self, file: &Path) -> Result<Option<PluginMetadata>> {
        let mut f = File::open(file)?;
        let Some(block) = locate(&mut f, file)? else {
            return Ok(None);
        };

        f.seek(SeekFrom::Start(block.json_start))?;
        let mut json = vec![0u8; block.json_len as usize];
        f.read_exact(&mut json)?;

        let got = hex::encode(Sha256::digest(&json));
        let want = hex::encode(block.digest);
        if got != want {
            return Err(MetaError::Digest {
                path: file.to_path_buf(),
                got,
                want,
            });
        }

        Ok(Some(serde_json::from_slice(&json)?))
    }
}

struct Block {
    json_start: u64,
    json_len: u64,
    digest: [u8; 32],
}

fn locate(f: &mut File, path: &Path) -> Result<Option<Block>> {
    let file_len = f.metadata()?.len();
    if file_len < FOOTER_LEN {
        return Ok(None);
    }

    f.seek(SeekFrom::Start(file_len - FOOTER_LEN))?;
    let mut footer = [0u8; FOOTER_LEN as usize];
    f.read_exact(&mut footer)?;

    let (rest, magic) = footer.split_at(footer.len() - MAGIC.len());
    if magic != MAGIC {
        return Ok(None);
    }
    let (digest, len_bytes) = rest.split_at(DIGEST_LEN as usize);

    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(len_bytes);
    let json_len = u64::from(u32::from_le_bytes(len_buf));
    if json_len == 0 || json_len > MAX_JSON_LEN || json_len > file_len - FOOTER_LEN {
        return Err(MetaError::BadLength {
            path: path.to_path_buf(),
            len: json_len,
        });
    }

    let mut d = [0u8; 32];
    d.copy_from_slice(digest);
    Ok(Some(Block {
        json_start: file_len - FOOTER_LEN - json_len,
        json_len,
        digest: d,
    }))
}

/// Write (or replace) the metadata trailer on `file`.
pub fn stamp(file: &Path, meta: &PluginMetadata) -> Result<()> {
    strip(file)?;

    let json = serde_json::to_vec(meta)?;
    let len = u32::try_from(json.len())
        .ok()
        .filter(|l| u64::from(*l) <= MAX_JSON_LEN)
        .ok_or_else(|| MetaError::BadLength {
            path: file.to_path_buf(),
            len: json.len() as u64,
        })?;

    let mut out = OpenOptions::new().append(true).open(file)?;
    out.write_all(&json)?;
    out.write_all(&Sha256::digest(&json))?;
    out.write_all(&len.to_le_bytes())?;
    out.write_all(MAGIC)?;
    out.flush()?;
    Ok(())
}

/// Remove an existing trailer. Returns `true` if one was present.
pub fn strip(file: &Path) -> Result<bool> {
    let mut f = OpenOptions::new().read(true).write(true).open(file)?;
    let Some(block) = locate(&mut f, file)? else {
        return Ok(false);
    };
    f.set_len(block.json_start)?;
    Ok(true)
}

/// Convenience for tests and tooling: a payload plus its trailer in one file.
pub fn write_stamped(file: &Path, payload: &[u8], meta: &PluginMetadata) -> Result<()> {
    fs::write(file, payload)?;
    stamp(file, meta)
}
