use dirs::{data_dir, home_dir};
use std::path::{Path, PathBuf};

/// ~/.local/share/ModUpdater   (or platform-equivalent)
/// `None` when neither a data dir nor a home dir can be determined.
pub fn updater_home() -> Option<PathBuf> {
    data_dir()
        .or_else(|| home_dir().map(|h| h.join(".local").join("share")))
        .map(|d| d.join("ModUpdater"))
}

/// ~/.local/share/ModUpdater/config.json
pub fn default_config_path() -> Option<PathBuf> {
    updater_home().map(|h| h.join("config.json"))
}

/// `<backup_dir>/<file name>`: one backup slot per file name.
pub fn backup_slot(backup_dir: &Path, file_name: &str) -> PathBuf {
    backup_dir.join(file_name)
}

/// Case-insensitive extension match (`Foo.DLL` counts as a dll).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// A path segment list that stays under its root: no absolute parts, no `..`.
pub fn is_contained(rel: &Path) -> bool {
    use std::path::Component;
    rel.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
