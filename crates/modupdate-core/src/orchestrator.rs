//! One update pass: inventory, resolve per source, plan, execute, clean up.

use crate::config::UpdaterConfig;
use crate::errors::{Result, UpdateError};
use crate::install::{self, make_backup, promote, restore, TempArea};
use crate::inventory::{file_name_of, read_item, scan_mods_dir};
use crate::manifest::{classify_asset, fetch_latest_release, fetch_manifest};
use crate::manifest::{AssetClassifier, AssetKind, SkipArchives};
use crate::net::{Remote, UpdaterClient};
use crate::paths::backup_slot;
use crate::plan::{self, DependencyAction, ItemPlan, SourceGroup};
use crate::source::SourceKind;
use crate::types::{
    BackupAction, DependencyOutcome, DependencyReport, InstalledItem, ItemOutcome, ItemReport,
    ReleaseAsset, UpdateReport, UpdaterManifest,
};
use crate::version::is_newer;
use modupdate_meta::{MetadataReader, PluginMetadata};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Build the shared client, run one pass, release the client.
/// Client construction failure is fatal.
pub fn run_with_client(
    cfg: &UpdaterConfig,
    reader: &dyn MetadataReader,
) -> Result<UpdateReport> {
    let client = UpdaterClient::new(cfg)?;
    let report = run_update_pass(cfg, &client, reader);
    drop(client);
    report
}

/// Run one pass with the default archive handling.
pub fn run_update_pass(
    cfg: &UpdaterConfig,
    remote: &dyn Remote,
    reader: &dyn MetadataReader,
) -> Result<UpdateReport> {
    Orchestrator::new(cfg, remote, reader).run()
}

pub struct Orchestrator<'a> {
    cfg: &'a UpdaterConfig,
    remote: &'a dyn Remote,
    reader: &'a dyn MetadataReader,
    classifier: &'a dyn AssetClassifier,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        cfg: &'a UpdaterConfig,
        remote: &'a dyn Remote,
        reader: &'a dyn MetadataReader,
    ) -> Self {
        Self {
            cfg,
            remote,
            reader,
            classifier: &SkipArchives,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn AssetClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Only an unreadable mods directory aborts the pass. Every per-item
    /// failure ends up in the report.
    pub fn run(&self) -> Result<UpdateReport> {
        let files = scan_mods_dir(&self.cfg.mods_dir, &self.cfg.binary_extension)?;
        tracing::info!(count = files.len(), dir = %self.cfg.mods_dir.display(), "scanning plugins");

        let temp = TempArea::new(self.cfg.temp_root());
        if let Err(e) = temp.prepare() {
            tracing::warn!(dir = %temp.path().display(), "could not prepare temporary directory: {e}");
        }

        let mut report = UpdateReport::default();
        let mut items = Vec::new();
        for path in &files {
            match read_item(self.reader, path) {
                Ok(item) => items.push(item),
                Err(e) => record(&mut report, &file_name_of(path), None, ItemOutcome::skipped(&e)),
            }
        }

        let mut run = PassState::default();
        for group in plan::group_by_source(items).values() {
            match &group.source.kind {
                SourceKind::GitHub { .. } => self.process_release_group(group, &mut report),
                SourceKind::Http { .. } => self.process_manifest_group(group, &mut report, &mut run),
            }
        }

        drop(temp);
        Ok(report)
    }

    fn process_manifest_group(
        &self,
        group: &SourceGroup,
        report: &mut UpdateReport,
        run: &mut PassState,
    ) {
        // items of one source usually share a namespace; fetch each manifest once
        let mut manifests: HashMap<String, std::result::Result<UpdaterManifest, ItemOutcome>> =
            HashMap::new();

        for item in &group.items {
            let manifest = manifests.entry(item.namespace.clone()).or_insert_with(|| {
                let url = group.source.manifest_url(self.cfg, &item.namespace);
                tracing::debug!(url = %url, "fetching updater manifest");
                fetch_manifest(self.remote, &url).map_err(|e| ItemOutcome::skipped(&e))
            });

            let outcome = match manifest {
                Err(skipped) => skipped.clone(),
                Ok(m) => {
                    let outcome = self
                        .update_from_manifest(item, m)
                        .unwrap_or_else(|e| ItemOutcome::skipped(&e));
                    self.install_dependencies(item, m, report, run);
                    outcome
                }
            };
            record(report, &item.file_name, Some(&group.source.key), outcome);
        }
    }

    fn update_from_manifest(
        &self,
        item: &InstalledItem,
        manifest: &UpdaterManifest,
    ) -> Result<ItemOutcome> {
        let planned = match plan::plan_manifest_item(self.cfg, item, manifest)? {
            ItemPlan::UpToDate { installed, latest } => {
                return Ok(ItemOutcome::UpToDate { installed, latest })
            }
            ItemPlan::Update(u) => u,
        };

        tracing::info!(file = %item.file_name, from = %item.version, to = %planned.version, "updating");
        if let Some(notes) = manifest.update_notes.as_deref().filter(|n| !n.trim().is_empty()) {
            tracing::info!(file = %item.file_name, "patch notes: {notes}");
        }

        let temp = self.cfg.temp_root().join(&item.file_name);
        install::download(self.remote, &planned.url, &temp)?;
        self.replace(item, &temp, item.metadata_at(&planned.version), planned.store_backup)
    }

    fn process_release_group(&self, group: &SourceGroup, report: &mut UpdateReport) {
        let assets = match group.source.latest_release_url(self.cfg) {
            Some(url) => fetch_latest_release(self.remote, &url),
            None => Err(UpdateError::MalformedSource(group.source.key.clone())),
        };
        let assets = match assets {
            Ok(a) => a,
            Err(e) => {
                for item in &group.items {
                    record(report, &item.file_name, Some(&group.source.key), ItemOutcome::skipped(&e));
                }
                return;
            }
        };

        let mut binaries: Vec<&ReleaseAsset> = Vec::new();
        for asset in &assets {
            match classify_asset(&asset.name, &self.cfg.binary_extension) {
                AssetKind::Binary => binaries.push(asset),
                AssetKind::Archive => self.classifier.archive(asset, &group.items),
                AssetKind::Other => tracing::debug!(asset = %asset.name, "ignoring release asset"),
            }
        }

        for item in &group.items {
            let outcome = match plan::match_asset(&binaries, &item.file_name) {
                Some(asset) => self
                    .update_from_asset(item, asset)
                    .unwrap_or_else(|e| ItemOutcome::skipped(&e)),
                None => ItemOutcome::skipped(&UpdateError::NoMatchingAsset(item.file_name.clone())),
            };
            record(report, &item.file_name, Some(&group.source.key), outcome);
        }
    }

    /// Release binaries carry their version inside, so the asset is fetched
    /// before the version check.
    fn update_from_asset(&self, item: &InstalledItem, asset: &ReleaseAsset) -> Result<ItemOutcome> {
        tracing::info!(file = %item.file_name, "downloading release asset for version check");
        let temp = self.cfg.temp_root().join(&item.file_name);
        install::download(self.remote, &asset.browser_download_url, &temp)?;

        let latest = match self.reader.read(&temp) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                return Err(UpdateError::MetadataUnreadable {
                    path: temp,
                    detail: "no metadata block in downloaded asset".into(),
                })
            }
            Err(e) => {
                return Err(UpdateError::MetadataUnreadable {
                    path: temp,
                    detail: e.to_string(),
                })
            }
        };

        if !is_newer(&latest.version, &item.version)? {
            return Ok(ItemOutcome::UpToDate {
                installed: item.version.clone(),
                latest: latest.version,
            });
        }

        tracing::info!(file = %item.file_name, from = %item.version, to = %latest.version, "updating");
        self.replace(item, &temp, latest, true)
    }

    /// Optional backup, then promotion, then the new metadata is recorded for
    /// readers that keep it outside the binary. A file moved into the backup
    /// slot is moved back if promotion fails.
    fn replace(
        &self,
        item: &InstalledItem,
        temp: &Path,
        new_meta: PluginMetadata,
        store_backup: bool,
    ) -> Result<ItemOutcome> {
        let backup_dir = self.cfg.backup_root();
        let backup = if store_backup {
            Some(make_backup(self.reader, &item.path, &backup_dir, &item.version)?)
        } else {
            None
        };

        if let Err(e) = promote(temp, &item.path) {
            if backup == Some(BackupAction::Moved) {
                let slot = backup_slot(&backup_dir, &item.file_name);
                if let Err(re) = restore(self.reader, &slot, &item.path) {
                    tracing::warn!(file = %item.file_name, "could not restore from backup: {re}");
                }
            }
            return Err(e);
        }

        if let Err(e) = self.reader.record(&item.path, &new_meta) {
            tracing::warn!(file = %item.file_name, "could not record metadata for new version: {e}");
        }

        tracing::info!(file = %item.file_name, version = %new_meta.version, "update complete");
        Ok(ItemOutcome::Updated {
            from: item.version.clone(),
            to: new_meta.version,
            backup,
        })
    }

    fn install_dependencies(
        &self,
        item: &InstalledItem,
        manifest: &UpdaterManifest,
        report: &mut UpdateReport,
        run: &mut PassState,
    ) {
        for dep in plan::plan_dependencies(self.cfg, item, manifest) {
            if !run.dependencies.insert(dep.destination.clone()) {
                continue;
            }

            let outcome = match dep.action {
                DependencyAction::Present => DependencyOutcome::Present,
                DependencyAction::Rejected(e) => failed(&e),
                DependencyAction::Fetch(fetch) => {
                    tracing::debug!(file = %dep.file_name, url = %fetch.url, forced = fetch.forced, "fetching dependency");
                    let temp = self.cfg.temp_root().join("deps").join(&dep.file_name);
                    match install::download(self.remote, &fetch.url, &temp)
                        .and_then(|_| promote(&temp, &fetch.destination))
                    {
                        Ok(()) => DependencyOutcome::Installed,
                        Err(e) => failed(&e),
                    }
                }
            };

            match &outcome {
                DependencyOutcome::Failed { message, .. } => {
                    tracing::warn!(file = %dep.file_name, required_by = %item.file_name, "dependency failed: {message}")
                }
                DependencyOutcome::Installed => {
                    tracing::info!(file = %dep.file_name, dest = %dep.destination.display(), "dependency installed")
                }
                DependencyOutcome::Present => {
                    tracing::debug!(file = %dep.file_name, "dependency already present")
                }
            }

            report.dependencies.push(DependencyReport {
                file_name: dep.file_name,
                destination: dep.destination,
                required_by: item.file_name.clone(),
                outcome,
            });
        }
    }
}

#[derive(Default)]
struct PassState {
    /// Destinations already handled this pass.
    dependencies: HashSet<PathBuf>,
}

fn failed(e: &UpdateError) -> DependencyOutcome {
    DependencyOutcome::Failed {
        reason: e.reason(),
        message: e.to_string(),
    }
}

fn record(report: &mut UpdateReport, file_name: &str, source: Option<&str>, outcome: ItemOutcome) {
    match &outcome {
        ItemOutcome::Updated { from, to, .. } => {
            tracing::info!(file = file_name, from = %from, to = %to, "updated")
        }
        ItemOutcome::UpToDate { installed, latest } => {
            tracing::info!(file = file_name, installed = %installed, latest = %latest, "already up to date")
        }
        ItemOutcome::Skipped { reason, message } if reason.is_warning() => {
            tracing::warn!(file = file_name, %reason, "skipping: {message}")
        }
        ItemOutcome::Skipped { reason, message } => {
            tracing::info!(file = file_name, %reason, "skipping: {message}")
        }
    }

    report.items.push(ItemReport {
        file_name: file_name.to_string(),
        source: source.map(str::to_string),
        outcome,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SkipReason;
    use crate::testing::{stamped, stamped_bytes, FakeRemote};
    use modupdate_meta::{SidecarReader, TrailerReader};
    use std::fs;

    const HOST: &str = "https://mods.example.com";
    const RELEASE: &str = "https://api.github.com/repos/o/r/releases/latest";

    struct Fixture {
        _root: tempfile::TempDir,
        mods: PathBuf,
        cfg: UpdaterConfig,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let mods = root.path().join("Mods");
        fs::create_dir_all(&mods).unwrap();
        let cfg = UpdaterConfig::new(&mods);
        Fixture {
            _root: root,
            mods,
            cfg,
        }
    }

    fn outcome<'r>(report: &'r UpdateReport, file: &str) -> &'r ItemOutcome {
        &report.item(file).unwrap_or_else(|| panic!("{file} missing")).outcome
    }

    #[test]
    fn same_version_is_skipped_without_side_effects() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let before = fs::read(&live).unwrap();
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.0.0", "StoreBackup": true }"#);

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert_eq!(
            outcome(&report, "ModA.dll"),
            &ItemOutcome::UpToDate {
                installed: "1.0.0".into(),
                latest: "1.0.0".into()
            }
        );
        assert_eq!(remote.requests(), [format!("{HOST}/ModA/updater.json")]);
        assert_eq!(fs::read(&live).unwrap(), before);
        assert!(!fx.cfg.backup_root().exists());
    }

    #[test]
    fn newer_manifest_backs_up_and_promotes() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let original = fs::read(&live).unwrap();
        let fresh = stamped_bytes("ModA.dll", b"v1.1", "1.1.0");
        let remote = FakeRemote::default()
            .with_text(
                &format!("{HOST}/ModA/updater.json"),
                r#"{ "Version": "1.1.0", "StoreBackup": true, "UpdateNotes": "fixes" }"#,
            )
            .with_bytes(&format!("{HOST}/ModA/bin/ModA.dll"), fresh.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert_eq!(
            outcome(&report, "ModA.dll"),
            &ItemOutcome::Updated {
                from: "1.0.0".into(),
                to: "1.1.0".into(),
                backup: Some(BackupAction::Moved)
            }
        );
        assert_eq!(fs::read(&live).unwrap(), fresh);
        let backup = fx.cfg.backup_root().join("ModA.dll");
        assert_eq!(fs::read(&backup).unwrap(), original);
        assert_eq!(TrailerReader.read(&backup).unwrap().unwrap().version, "1.0.0");
        assert!(!fx.cfg.temp_root().exists(), "temp area is removed after the pass");
    }

    #[test]
    fn no_backup_when_manifest_says_so() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let fresh = stamped_bytes("ModA.dll", b"v2", "2.0");
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "2.0" }"#)
            .with_bytes(&format!("{HOST}/ModA/bin/ModA.dll"), fresh.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Updated { backup: None, .. }
        ));
        assert_eq!(fs::read(&live).unwrap(), fresh);
        assert!(!fx.cfg.backup_root().exists());
    }

    #[test]
    fn failed_download_leaves_live_file_alone() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let before = fs::read(&live).unwrap();
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.1.0", "StoreBackup": true }"#);

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        match outcome(&report, "ModA.dll") {
            ItemOutcome::Skipped { reason, .. } => assert_eq!(*reason, SkipReason::TransferFailed),
            other => panic!("expected skip, got {other:?}"),
        }
        assert_eq!(fs::read(&live).unwrap(), before);
        assert!(!fx.cfg.backup_root().join("ModA.dll").exists());
    }

    #[test]
    fn github_release_only_touches_installed_assets() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some("https://github.com/o/r"));
        let fresh = stamped_bytes("ModA.dll", b"v1.2", "1.2.0");
        let remote = FakeRemote::default()
            .with_text(
                RELEASE,
                r#"{ "assets": [
                    { "name": "ModA.dll", "browser_download_url": "https://dl.example.com/ModA.dll" },
                    { "name": "ModB.dll", "browser_download_url": "https://dl.example.com/ModB.dll" },
                    { "name": "Server.zip", "browser_download_url": "https://dl.example.com/Server.zip" }
                ] }"#,
            )
            .with_bytes("https://dl.example.com/ModA.dll", fresh.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert_eq!(
            remote.requests(),
            [RELEASE.to_string(), "https://dl.example.com/ModA.dll".to_string()]
        );
        assert!(!fx.mods.join("ModB.dll").exists());
        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Updated { backup: Some(BackupAction::Moved), .. }
        ));
        assert_eq!(fs::read(&live).unwrap(), fresh);
    }

    #[test]
    fn github_asset_that_is_not_newer_is_not_promoted() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.2.0", Some("https://github.com/o/r"));
        let before = fs::read(&live).unwrap();
        let remote = FakeRemote::default()
            .with_text(
                RELEASE,
                r#"{ "assets": [ { "name": "moda.dll", "browser_download_url": "https://dl.example.com/a" } ] }"#,
            )
            .with_bytes("https://dl.example.com/a", stamped_bytes("ModA.dll", b"old", "1.1.9"));

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert_eq!(
            outcome(&report, "ModA.dll"),
            &ItemOutcome::UpToDate {
                installed: "1.2.0".into(),
                latest: "1.1.9".into()
            }
        );
        assert_eq!(fs::read(&live).unwrap(), before);
        assert!(!fx.cfg.backup_root().exists());
    }

    #[test]
    fn github_item_without_asset_is_reported() {
        let fx = fixture();
        stamped(&fx.mods, "ModC.dll", b"v1", "1.0", Some("https://github.com/o/r"));
        let remote = FakeRemote::default().with_text(RELEASE, r#"{ "assets": [] }"#);

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();
        assert!(matches!(
            outcome(&report, "ModC.dll"),
            ItemOutcome::Skipped { reason: SkipReason::NoMatchingAsset, .. }
        ));
    }

    #[test]
    fn dependencies_follow_force_update() {
        let fx = fixture();
        let libs = fx.cfg.install_root().join("UserLibs");
        fs::create_dir_all(&libs).unwrap();
        fs::write(libs.join("Lib.dll"), b"local lib").unwrap();
        fs::write(libs.join("Forced.dll"), b"local forced").unwrap();
        stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));

        let remote = FakeRemote::default()
            .with_text(
                &format!("{HOST}/ModA/updater.json"),
                r#"{ "Version": "1.0.0", "Dependencies": [
                    { "Filename": "Lib.dll", "RemoteURL": "libs/Lib.dll", "LocalPath": "UserLibs", "ForceUpdate": false },
                    { "Filename": "Forced.dll", "RemoteURL": "libs/Forced.dll", "LocalPath": "UserLibs", "ForceUpdate": true },
                    { "Filename": "Missing.dll", "RemoteFullPath": "https://cdn.example.com/Missing.dll", "LocalPath": "UserLibs" }
                ] }"#,
            )
            .with_bytes(&format!("{HOST}/ModA/libs/Forced.dll"), b"remote forced".to_vec())
            .with_bytes("https://cdn.example.com/Missing.dll", b"remote missing".to_vec());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert_eq!(remote.hits(&format!("{HOST}/ModA/libs/Lib.dll")), 0);
        assert_eq!(fs::read(libs.join("Lib.dll")).unwrap(), b"local lib");
        assert_eq!(fs::read(libs.join("Forced.dll")).unwrap(), b"remote forced");
        assert_eq!(fs::read(libs.join("Missing.dll")).unwrap(), b"remote missing");

        let outcomes: Vec<(&str, &DependencyOutcome)> = report
            .dependencies
            .iter()
            .map(|d| (d.file_name.as_str(), &d.outcome))
            .collect();
        assert_eq!(
            outcomes,
            [
                ("Lib.dll", &DependencyOutcome::Present),
                ("Forced.dll", &DependencyOutcome::Installed),
                ("Missing.dll", &DependencyOutcome::Installed),
            ]
        );
    }

    #[test]
    fn malformed_manifest_does_not_stop_later_groups() {
        let fx = fixture();
        let a = stamped(&fx.mods, "ModA.dll", b"a1", "1.0", Some("https://a.example.com"));
        let b = stamped(&fx.mods, "ModB.dll", b"b1", "1.0", Some("https://b.example.com"));
        let a_before = fs::read(&a).unwrap();
        let fresh_b = stamped_bytes("ModB.dll", b"b2", "1.1");

        let remote = FakeRemote::default()
            .with_text("https://a.example.com/ModA/updater.json", "{ this is not json")
            .with_text("https://b.example.com/ModB/updater.json", r#"{ "Version": "1.1" }"#)
            .with_bytes("https://b.example.com/ModB/bin/ModB.dll", fresh_b.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Skipped { reason: SkipReason::ManifestUnavailable, .. }
        ));
        assert!(matches!(outcome(&report, "ModB.dll"), ItemOutcome::Updated { .. }));
        assert_eq!(fs::read(&a).unwrap(), a_before);
        assert_eq!(fs::read(&b).unwrap(), fresh_b);
    }

    #[test]
    fn manifest_fetched_once_per_namespace() {
        let fx = fixture();
        let mut second = crate::testing::meta("ModA.Extra.dll", "1.0", Some(HOST));
        second.type_name = "ModA.Extra".into();
        modupdate_meta::write_stamped(&fx.mods.join("ModA.Extra.dll"), b"x", &second).unwrap();
        stamped(&fx.mods, "ModA.dll", b"x", "1.0", Some(HOST));

        let url = format!("{HOST}/ModA/updater.json");
        let remote = FakeRemote::default().with_text(&url, r#"{ "Version": "1.0" }"#);

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();
        assert_eq!(remote.hits(&url), 1);
        assert_eq!(report.items.len(), 2);
    }

    #[test]
    fn inventory_skips_are_reported_in_scan_order() {
        let fx = fixture();
        fs::write(fx.mods.join("Bare.dll"), b"no metadata").unwrap();
        stamped(&fx.mods, "Local.dll", b"x", "1.0", None);
        stamped(&fx.mods, "Odd.dll", b"x", "1.0", Some("ftp://files.example.com"));
        stamped(&fx.mods, "Ver.dll", b"x", "1.x", Some(HOST));
        let remote = FakeRemote::default().with_text(&format!("{HOST}/Ver/updater.json"), r#"{ "Version": "2.0" }"#);

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        let reasons: Vec<(&str, SkipReason)> = report
            .items
            .iter()
            .map(|r| match &r.outcome {
                ItemOutcome::Skipped { reason, .. } => (r.file_name.as_str(), *reason),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            [
                ("Bare.dll", SkipReason::MetadataUnreadable),
                ("Local.dll", SkipReason::NoUpdateSource),
                ("Odd.dll", SkipReason::MalformedSource),
                ("Ver.dll", SkipReason::InvalidVersion),
            ]
        );
    }

    #[test]
    fn missing_mods_dir_is_fatal() {
        let fx = fixture();
        let cfg = UpdaterConfig::new(fx.mods.join("does-not-exist"));
        assert!(run_update_pass(&cfg, &FakeRemote::default(), &TrailerReader).is_err());
    }

    #[test]
    fn sidecar_metadata_follows_the_update() {
        let fx = fixture();
        let live = fx.mods.join("ModA.dll");
        fs::write(&live, b"v1.0").unwrap();
        SidecarReader
            .record(&live, &crate::testing::meta("ModA.dll", "1.0.0", Some(HOST)))
            .unwrap();
        let bin_url = format!("{HOST}/ModA/bin/ModA.dll");
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.1.0", "StoreBackup": true }"#)
            .with_bytes(&bin_url, b"v1.1".to_vec());

        let first = run_update_pass(&fx.cfg, &remote, &SidecarReader).unwrap();
        assert!(matches!(
            outcome(&first, "ModA.dll"),
            ItemOutcome::Updated { backup: Some(BackupAction::Moved), .. }
        ));
        let slot = fx.cfg.backup_root().join("ModA.dll");
        assert_eq!(SidecarReader.read(&live).unwrap().unwrap().version, "1.1.0");
        assert_eq!(SidecarReader.read(&slot).unwrap().unwrap().version, "1.0.0");

        let second = run_update_pass(&fx.cfg, &remote, &SidecarReader).unwrap();
        assert_eq!(
            outcome(&second, "ModA.dll"),
            &ItemOutcome::UpToDate {
                installed: "1.1.0".into(),
                latest: "1.1.0".into()
            }
        );
        assert_eq!(remote.hits(&bin_url), 1);
        assert_eq!(fs::read(&live).unwrap(), b"v1.1");
        assert_eq!(fs::read(&slot).unwrap(), b"v1.0");
    }

    #[test]
    fn newer_backup_is_kept_through_a_pass() {
        let fx = fixture();
        let backups = fx.cfg.backup_root();
        fs::create_dir_all(&backups).unwrap();
        let slot = stamped(&backups, "ModA.dll", b"backup", "1.1.0", Some(HOST));
        let slot_before = fs::read(&slot).unwrap();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let fresh = stamped_bytes("ModA.dll", b"v1.0.5", "1.0.5");
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.0.5", "StoreBackup": true }"#)
            .with_bytes(&format!("{HOST}/ModA/bin/ModA.dll"), fresh.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Updated { backup: Some(BackupAction::Kept), .. }
        ));
        assert_eq!(fs::read(&slot).unwrap(), slot_before);
        assert_eq!(fs::read(&live).unwrap(), fresh);
    }

    #[test]
    fn older_backup_is_overwritten_through_a_pass() {
        let fx = fixture();
        let backups = fx.cfg.backup_root();
        fs::create_dir_all(&backups).unwrap();
        let slot = stamped(&backups, "ModA.dll", b"backup", "0.9", Some(HOST));
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let original = fs::read(&live).unwrap();
        let fresh = stamped_bytes("ModA.dll", b"v1.1", "1.1");
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.1", "StoreBackup": true }"#)
            .with_bytes(&format!("{HOST}/ModA/bin/ModA.dll"), fresh.clone());

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Updated { backup: Some(BackupAction::Overwritten), .. }
        ));
        assert_eq!(fs::read(&slot).unwrap(), original);
        assert_eq!(fs::read(&live).unwrap(), fresh);
    }

    #[test]
    fn failed_promotion_restores_moved_backup() {
        let fx = fixture();
        let live = stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let original = fs::read(&live).unwrap();
        // a directory where the staging file would go makes promotion fail
        fs::create_dir_all(fx.mods.join("ModA.dll.partial")).unwrap();
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.1.0", "StoreBackup": true }"#)
            .with_bytes(
                &format!("{HOST}/ModA/bin/ModA.dll"),
                stamped_bytes("ModA.dll", b"v1.1", "1.1.0"),
            );

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(
            outcome(&report, "ModA.dll"),
            ItemOutcome::Skipped { reason: SkipReason::TransferFailed, .. }
        ));
        assert_eq!(fs::read(&live).unwrap(), original);
        assert!(!fx.cfg.backup_root().join("ModA.dll").exists());
    }

    #[test]
    fn shared_temp_dir_keeps_foreign_files() {
        let mut fx = fixture();
        let shared = fx._root.path().join("shared-tmp");
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("someone-else.txt"), b"keep me").unwrap();
        fx.cfg.temp_dir = Some(shared.clone());

        stamped(&fx.mods, "ModA.dll", b"v1", "1.0.0", Some(HOST));
        let remote = FakeRemote::default()
            .with_text(&format!("{HOST}/ModA/updater.json"), r#"{ "Version": "1.1.0" }"#)
            .with_bytes(
                &format!("{HOST}/ModA/bin/ModA.dll"),
                stamped_bytes("ModA.dll", b"v1.1", "1.1.0"),
            );

        let report = run_update_pass(&fx.cfg, &remote, &TrailerReader).unwrap();

        assert!(matches!(outcome(&report, "ModA.dll"), ItemOutcome::Updated { .. }));
        assert_eq!(fs::read(shared.join("someone-else.txt")).unwrap(), b"keep me");
        assert!(!fx.cfg.temp_root().exists());
    }
}
