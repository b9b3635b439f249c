use crate::errors::Result;
use crate::paths::backup_slot;
use crate::types::BackupAction;
use crate::version::is_newer;
use anyhow::Context;
use modupdate_meta::MetadataReader;
use std::fs;
use std::path::Path;

/// Overwrite `existing` only when `candidate_version` is newer than what it
/// holds. An unreadable backup is always overwritten.
pub fn should_overwrite_backup(
    reader: &dyn MetadataReader,
    existing: &Path,
    candidate_version: &str,
) -> bool {
    let backup_version = match reader.read(existing) {
        Ok(Some(meta)) => meta.version,
        Ok(None) => return true,
        Err(e) => {
            tracing::warn!(backup = %existing.display(), "unreadable backup: {e}");
            return true;
        }
    };

    is_newer(candidate_version, &backup_version).unwrap_or(true)
}

/// Archive `live` (currently at `version`) into `backup_dir` ahead of a
/// replacement. The caller promotes the new file whatever the action.
pub fn make_backup(
    reader: &dyn MetadataReader,
    live: &Path,
    backup_dir: &Path,
    version: &str,
) -> Result<BackupAction> {
    if !backup_dir.is_dir() {
        tracing::info!(dir = %backup_dir.display(), "creating backup directory");
        fs::create_dir_all(backup_dir)
            .with_context(|| format!("mkdir {}", backup_dir.display()))?;
    }

    let file_name = live
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("no file name in {}", live.display()))?;
    let slot = backup_slot(backup_dir, file_name);

    if !slot.exists() {
        tracing::info!(file = file_name, "moving to backup directory");
        let companions = reader.companions(live, &slot);
        move_file(live, &slot)?;
        for (from, to) in companions {
            move_file(&from, &to)?;
        }
        return Ok(BackupAction::Moved);
    }

    if should_overwrite_backup(reader, &slot, version) {
        tracing::info!(file = file_name, version, "overwriting existing backup");
        fs::copy(live, &slot).with_context(|| format!("copy {} to backup", live.display()))?;
        for (from, to) in reader.companions(live, &slot) {
            fs::copy(&from, &to).with_context(|| format!("copy {} to backup", from.display()))?;
        }
        Ok(BackupAction::Overwritten)
    } else {
        tracing::info!(file = file_name, version, "existing backup is newer, keeping it");
        Ok(BackupAction::Kept)
    }
}

/// `rename`, falling back to copy + remove across filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).with_context(|| format!("copy {} -> {}", from.display(), to.display()))?;
    fs::remove_file(from).with_context(|| format!("remove {}", from.display()))?;
    Ok(())
}
