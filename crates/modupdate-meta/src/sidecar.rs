use crate::metadata::{MetadataReader, PluginMetadata, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `<binary>.meta.json` next to the binary.
/// Downloaded copies carry no sidecar, so GitHub release assets read as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarReader;

impl SidecarReader {
    pub fn sidecar_path(file: &Path) -> PathBuf {
        let mut name = file.file_name().map(OsString::from).unwrap_or_default();
        name.push(".meta.json");
        file.with_file_name(name)
    }
}

impl MetadataReader for SidecarReader {
    fn read(&self, file: &Path) -> Result<Option<PluginMetadata>> {
        let path = Self::sidecar_path(file);
        if !path.is_file() {
            return Ok(None);
        }
        let txt = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&txt)?))
    }

    fn companions(&self, file: &Path, dest: &Path) -> Vec<(PathBuf, PathBuf)> {
        let src = Self::sidecar_path(file);
        if src.is_file() {
            vec![(src, Self::sidecar_path(dest))]
        } else {
            Vec::new()
        }
    }

    fn record(&self, file: &Path, meta: &PluginMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(meta)?;
        fs::write(Self::sidecar_path(file), json)?;
        Ok(())
    }
}
