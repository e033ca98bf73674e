//! Voice pack registry
//!
//! Owns the authoritative in-memory index of installed packs. A rescan
//! builds a whole new index and swaps it in atomically; readers never see
//! a partially built one. The two runtime fields on an entry (load state,
//! update status) are mutated in place on the shared entry and are safe to
//! race with concurrent readers holding the same snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use semver::Version;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::packages::catalog::CatalogClient;
use crate::packages::manifest::{ManifestSpeaker, ManifestStyle, ModelManifest, data_url_base64};
use crate::packages::reader::{PackageFormat, read_package};
use crate::packages::style_id::{self, StyleId};

/// Published index generation: name-sorted, identity-unique
pub type Snapshot = Arc<Vec<Arc<PackageEntry>>>;

/// Update-check state of one installed pack
#[derive(Debug, Clone)]
pub struct UpdateStatus {
    /// Latest version the catalog reported; starts out as the installed
    /// version until a reconciliation pass says otherwise
    pub latest_version: Version,
    pub update_available: bool,
}

/// A speaker as exposed to callers, styles carrying global identifiers
#[derive(Debug, Clone, Serialize)]
pub struct Speaker {
    pub uuid: Uuid,
    pub name: String,
    /// The owning pack's version doubles as the speaker version
    pub version: String,
    pub styles: Vec<SpeakerStyle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeakerStyle {
    pub id: StyleId,
    pub name: String,
}

/// Additional display metadata for one speaker
#[derive(Debug, Clone, Serialize)]
pub struct SpeakerDetail {
    /// License text shared by every speaker in the pack
    pub license: String,
    /// Icon as base64
    pub icon: String,
    pub styles: Vec<StyleDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleDetail {
    pub id: StyleId,
    /// Style icon as base64; falls back to the speaker icon
    pub icon: String,
    pub voice_samples: Vec<String>,
    pub voice_sample_transcripts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeakerMeta {
    pub speaker: Speaker,
    pub detail: SpeakerDetail,
}

/// A style resolved back to its manifest context
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedStyle {
    pub manifest: ModelManifest,
    pub speaker: ManifestSpeaker,
    pub style: ManifestStyle,
}

/// One installed voice pack
#[derive(Debug)]
pub struct PackageEntry {
    pub file_path: PathBuf,
    pub file_size: u64,
    pub format: PackageFormat,
    pub manifest: ModelManifest,
    /// Speakers supporting the target language, with derived display
    /// metadata and global style identifiers
    pub speakers: Vec<SpeakerMeta>,
    is_loaded: AtomicBool,
    update: RwLock<UpdateStatus>,
}

impl PackageEntry {
    fn assemble(
        file_path: PathBuf,
        file_size: u64,
        format: PackageFormat,
        manifest: ModelManifest,
        language: &str,
    ) -> Result<Self> {
        let speakers = assemble_speakers(&manifest, language)?;
        let update = UpdateStatus {
            latest_version: manifest.version.clone(),
            update_available: false,
        };

        Ok(Self {
            file_path,
            file_size,
            format,
            manifest,
            speakers,
            is_loaded: AtomicBool::new(false),
            update: RwLock::new(update),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded.load(Ordering::Relaxed)
    }

    fn set_loaded(&self, loaded: bool) {
        self.is_loaded.store(loaded, Ordering::Relaxed);
    }

    pub async fn update_status(&self) -> UpdateStatus {
        self.update.read().await.clone()
    }
}

/// Derive the caller-facing speaker metadata from a manifest, dropping
/// speakers that do not support the target language
fn assemble_speakers(manifest: &ModelManifest, language: &str) -> Result<Vec<SpeakerMeta>> {
    let mut out = Vec::new();

    for speaker in &manifest.speakers {
        if !speaker.supports_language(language) {
            tracing::warn!(
                model = %manifest.uuid,
                speaker = %speaker.uuid,
                language,
                "Speaker does not support the target language, ignoring"
            );
            continue;
        }

        let speaker_icon = data_url_base64(&speaker.icon)?;

        let mut styles = Vec::new();
        let mut details = Vec::new();
        for style in &speaker.styles {
            let id = style_id::encode(&speaker.uuid.to_string(), style.local_id)?;

            styles.push(SpeakerStyle {
                id,
                name: style.name.clone(),
            });

            let icon = match &style.icon {
                Some(icon) => data_url_base64(icon)?,
                None => speaker_icon.clone(),
            };
            let voice_samples = style
                .voice_samples
                .iter()
                .map(|s| data_url_base64(&s.audio))
                .collect::<Result<Vec<_>>>()?;
            let voice_sample_transcripts = style
                .voice_samples
                .iter()
                .map(|s| s.transcript.clone())
                .collect();

            details.push(StyleDetail {
                id,
                icon,
                voice_samples,
                voice_sample_transcripts,
            });
        }

        out.push(SpeakerMeta {
            speaker: Speaker {
                uuid: speaker.uuid,
                name: speaker.name.clone(),
                version: manifest.version.to_string(),
                styles,
            },
            detail: SpeakerDetail {
                license: manifest.license.clone().unwrap_or_default(),
                icon: speaker_icon,
                styles: details,
            },
        });
    }

    Ok(out)
}

/// Registry of installed voice packs
pub struct PackageRegistry {
    install_dir: PathBuf,
    language: String,
    catalog: CatalogClient,
    index: RwLock<Option<Snapshot>>,
    /// Serializes whole-index rebuilds
    scan_lock: Mutex<()>,
}

impl PackageRegistry {
    /// Create a registry without scanning; `bootstrap` is the normal
    /// entry point
    pub fn new(install_dir: PathBuf, language: String, catalog: CatalogClient) -> Self {
        Self {
            install_dir,
            language,
            catalog,
            index: RwLock::new(None),
            scan_lock: Mutex::new(()),
        }
    }

    /// Create the install directory if needed, run the initial scan, and
    /// install the configured default packs when the directory is empty.
    /// An unreachable catalog is logged, never fatal: the process must come
    /// up even if the registry is transiently empty.
    pub async fn bootstrap(config: &ManagerConfig, catalog: CatalogClient) -> Result<Arc<Self>> {
        std::fs::create_dir_all(&config.install_dir)
            .map_err(|e| ManagerError::storage(e, "failed to create install directory"))?;
        tracing::info!(dir = ?config.install_dir, "Models directory");

        let registry = Arc::new(Self::new(
            config.install_dir.clone(),
            config.language.clone(),
            catalog,
        ));

        let entries = registry.entries(true, false).await;
        if entries.is_empty() {
            tracing::warn!("No voice packs are installed, installing defaults");
            for uuid in &config.default_models {
                let url = registry.catalog.download_url(uuid);
                tracing::info!(model = %uuid, url = %url, "Installing default voice pack");
                if let Err(e) = registry.install_from_url(&url).await {
                    tracing::warn!(model = %uuid, error = %e, "Failed to install default voice pack");
                }
            }
        } else {
            tracing::info!("Installed voice packs:");
            for entry in entries.iter() {
                tracing::info!("- {} ({})", entry.manifest.name, entry.manifest.uuid);
            }
        }

        Ok(registry)
    }

    /// Current index, rescanning the install directory when forced or when
    /// no scan has completed yet. The update check against the catalog runs
    /// detached unless `wait_for_update_check` is set.
    pub async fn entries(&self, force_rescan: bool, wait_for_update_check: bool) -> Snapshot {
        if !force_rescan && let Some(snapshot) = self.index.read().await.clone() {
            return snapshot;
        }
        self.rescan(wait_for_update_check).await
    }

    async fn rescan(&self, wait_for_update_check: bool) -> Snapshot {
        let _scan = self.scan_lock.lock().await;

        let previous = self.index.read().await.clone();

        let mut entries: Vec<Arc<PackageEntry>> = Vec::new();
        for path in self.pack_file_paths() {
            match self.read_entry(&path) {
                Ok(entry) => {
                    if let Some(existing) = entries
                        .iter()
                        .find(|e| e.manifest.uuid == entry.manifest.uuid)
                    {
                        tracing::info!(
                            path = ?path,
                            model = %entry.manifest.uuid,
                            indexed = ?existing.file_path,
                            "Model is already installed, ignoring duplicate file"
                        );
                        continue;
                    }
                    entries.push(Arc::new(entry));
                }
                Err(err) => {
                    tracing::warn!(path = ?path, error = %err, "Skipping invalid pack file");
                }
            }
        }

        entries.sort_by(|a, b| a.manifest.name.cmp(&b.manifest.name));

        // Load state is runtime state, not pack state; carry it across
        // rebuilds for identities that persist
        if let Some(previous) = &previous {
            for entry in &entries {
                if let Some(prev) = previous
                    .iter()
                    .find(|p| p.manifest.uuid == entry.manifest.uuid)
                {
                    entry.set_loaded(prev.is_loaded());
                }
            }
        }

        let snapshot: Snapshot = Arc::new(entries);
        *self.index.write().await = Some(snapshot.clone());

        if wait_for_update_check {
            check_updates(self.catalog.clone(), snapshot.clone()).await;
        } else {
            // Startup and request handling never wait on catalog latency
            let catalog = self.catalog.clone();
            let detached = snapshot.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        check_updates(catalog, detached).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to start background update check");
                }
            }
        }

        snapshot
    }

    /// Pack files currently in the install directory, in stable order.
    /// Scan order decides which of two duplicate-identity files wins.
    fn pack_file_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        match std::fs::read_dir(&self.install_dir) {
            Ok(dir) => {
                for entry in dir.flatten() {
                    let path = entry.path();
                    if path.is_file() && PackageFormat::matches_path(&path) {
                        paths.push(path);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(dir = ?self.install_dir, error = %e, "Failed to read install directory");
            }
        }
        paths.sort();
        paths
    }

    fn read_entry(&self, path: &Path) -> std::result::Result<PackageEntry, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("failed to read file: {e}"))?;
        let (manifest, format) = read_package(&bytes).map_err(|e| e.to_string())?;

        if !manifest.manifest_version_supported() {
            return Err(format!(
                "manifest version {} is not supported (different major version)",
                manifest.manifest_version
            ));
        }
        if !manifest.manifest_version_listed() {
            tracing::warn!(
                path = ?path,
                version = %manifest.manifest_version,
                "Manifest version is newer than supported, trying to load anyway"
            );
        }
        if !manifest.model_architecture.is_supported() {
            return Err(format!(
                "model architecture {} is not supported",
                manifest.model_architecture
            ));
        }

        PackageEntry::assemble(
            path.to_path_buf(),
            bytes.len() as u64,
            format,
            manifest,
            &self.language,
        )
        .map_err(|e| e.to_string())
    }

    /// Look up one installed pack by model identity
    pub async fn entry(&self, uuid: &Uuid) -> Result<Arc<PackageEntry>> {
        self.entries(false, false)
            .await
            .iter()
            .find(|e| e.manifest.uuid == *uuid)
            .cloned()
            .ok_or_else(|| ManagerError::model_not_found(uuid))
    }

    /// All speakers across installed packs, sorted by display name
    pub async fn speakers(&self) -> Vec<Speaker> {
        let mut speakers: Vec<Speaker> = self
            .entries(false, false)
            .await
            .iter()
            .flat_map(|e| e.speakers.iter().map(|m| m.speaker.clone()))
            .collect();
        speakers.sort_by(|a, b| a.name.cmp(&b.name));
        speakers
    }

    pub async fn speaker_detail(&self, uuid: &Uuid) -> Result<SpeakerDetail> {
        for entry in self.entries(false, false).await.iter() {
            for meta in &entry.speakers {
                if meta.speaker.uuid == *uuid {
                    return Ok(meta.detail.clone());
                }
            }
        }
        Err(ManagerError::speaker_not_found(uuid))
    }

    /// Resolve a global style identifier back to its manifest context.
    /// The identity half of the identifier is not invertible, so this is a
    /// scan over the index
    pub async fn style(&self, id: StyleId) -> Result<ResolvedStyle> {
        let snapshot = self.entries(false, false).await;
        for entry in snapshot.iter() {
            for meta in &entry.speakers {
                if !meta.speaker.styles.iter().any(|s| s.id == id) {
                    continue;
                }
                let local = style_id::local_index(id);
                if let Some(speaker) = entry
                    .manifest
                    .speakers
                    .iter()
                    .find(|s| s.uuid == meta.speaker.uuid)
                    && let Some(style) = speaker.styles.iter().find(|s| s.local_id == local)
                {
                    return Ok(ResolvedStyle {
                        manifest: entry.manifest.clone(),
                        speaker: speaker.clone(),
                        style: style.clone(),
                    });
                }
            }
        }
        Err(ManagerError::style_not_found(id))
    }

    /// Record whether the synthesis engine has a pack loaded. Idempotent;
    /// unknown identities (including before the first scan) are a no-op.
    pub async fn set_load_state(&self, uuid: &Uuid, loaded: bool) {
        if let Some(snapshot) = self.index.read().await.clone()
            && let Some(entry) = snapshot.iter().find(|e| e.manifest.uuid == *uuid)
        {
            entry.set_loaded(loaded);
        }
    }

    /// Install a pack from raw bytes, overwriting in place when the same
    /// identity is already installed. Returns the installed model identity
    /// after a forced rescan with a waited update check, so the caller
    /// observes final state.
    pub async fn install(&self, bytes: &[u8]) -> Result<Uuid> {
        let (manifest, format) = read_package(bytes)?;

        if !manifest.manifest_version_listed() {
            return Err(ManagerError::PackageFormat(format!(
                "manifest version {} is not supported",
                manifest.manifest_version
            )));
        }
        if !manifest.model_architecture.is_supported() {
            return Err(ManagerError::PackageFormat(format!(
                "model architecture \"{}\" is not supported",
                manifest.model_architecture
            )));
        }

        // Canonical name is <identity>.<ext>, but a manually placed file
        // keeps its name on overwrite
        let mut file_path = self
            .install_dir
            .join(format!("{}.{}", manifest.uuid, format.extension()));
        if let Ok(existing) = self.entry(&manifest.uuid).await {
            tracing::info!(model = %manifest.uuid, "Model is already installed, updating");
            file_path = existing.file_path.clone();
        }

        tracing::info!(path = ?file_path, "Installing voice pack");
        self.write_pack_file(&file_path, bytes)?;
        tracing::info!(path = ?file_path, "Installed voice pack");

        self.entries(true, true).await;
        Ok(manifest.uuid)
    }

    /// Stage to a temp file in the install directory, then move into
    /// place, so a crash never leaves a partial pack behind
    fn write_pack_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.install_dir)
            .map_err(|e| ManagerError::storage(e, "failed to stage voice pack"))?;
        tmp.write_all(bytes)
            .map_err(|e| ManagerError::storage(e, "failed to write voice pack"))?;
        tmp.persist(path)
            .map_err(|e| ManagerError::storage(e.error, "failed to place voice pack"))?;
        Ok(())
    }

    /// Download a pack and install it. Catalog model-page URLs are
    /// rewritten to the direct download endpoint.
    pub async fn install_from_url(&self, url: &str) -> Result<Uuid> {
        let url = self.catalog.resolve_download_url(url)?;
        let bytes = self.catalog.download(&url).await?;
        self.install(&bytes).await
    }

    /// Fetch the newest catalog version of an installed pack and overwrite
    /// the local file with it
    pub async fn update(&self, uuid: &Uuid) -> Result<()> {
        let entry = self.entry(uuid).await?;
        let status = entry.update_status().await;
        if !status.update_available {
            return Err(ManagerError::NoUpdateAvailable(*uuid));
        }

        tracing::info!(
            model = %uuid,
            latest = %status.latest_version,
            "Updating voice pack"
        );
        self.install_from_url(&self.catalog.download_url(uuid)).await?;
        tracing::info!(model = %uuid, "Updated voice pack");
        Ok(())
    }

    /// Delete an installed pack and its backing file. Refused when it is
    /// the last one: the registry must never go empty.
    pub async fn uninstall(&self, uuid: &Uuid) -> Result<()> {
        let snapshot = self.entries(false, false).await;
        let entry = snapshot
            .iter()
            .find(|e| e.manifest.uuid == *uuid)
            .cloned()
            .ok_or_else(|| ManagerError::model_not_found(uuid))?;

        if snapshot.len() <= 1 {
            return Err(ManagerError::MinimumCardinality);
        }

        tracing::info!(path = ?entry.file_path, "Uninstalling voice pack");
        match std::fs::remove_file(&entry.file_path) {
            Ok(()) => {}
            // Already gone; the rescan below drops the entry either way
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ManagerError::storage(e, "failed to delete voice pack")),
        }
        tracing::info!(path = ?entry.file_path, "Uninstalled voice pack");

        self.entries(true, true).await;
        Ok(())
    }
}

/// One reconciliation pass: refresh every entry's update status against
/// the catalog. Per-entry failures are logged and contained; the pass as a
/// whole never fails.
async fn check_updates(catalog: CatalogClient, snapshot: Snapshot) {
    let tasks = snapshot
        .iter()
        .map(|entry| check_entry_update(&catalog, entry.clone()));
    futures::future::join_all(tasks).await;

    let mut available = Vec::new();
    for entry in snapshot.iter() {
        let status = entry.update_status().await;
        if status.update_available {
            available.push((entry.clone(), status.latest_version));
        }
    }
    if !available.is_empty() {
        tracing::info!("Update available models:");
        for (entry, latest) in available {
            tracing::info!(
                "- {} ({}) v{} -> v{}",
                entry.manifest.name,
                entry.manifest.uuid,
                entry.manifest.version,
                latest
            );
        }
    }
}

async fn check_entry_update(catalog: &CatalogClient, entry: Arc<PackageEntry>) {
    match catalog.model_listing(&entry.manifest.uuid).await {
        Ok(Some(listing)) => {
            let Some(version) = listing.packed_version() else {
                return;
            };
            match Version::parse(version) {
                Ok(latest) => {
                    let update_available = latest > entry.manifest.version;
                    let mut status = entry.update.write().await;
                    status.latest_version = latest;
                    status.update_available = update_available;
                }
                Err(e) => {
                    tracing::warn!(
                        model = %entry.manifest.uuid,
                        version,
                        error = %e,
                        "Catalog reported an unparseable version"
                    );
                }
            }
        }
        // Not listed on the catalog; nothing to reconcile
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(
                model = %entry.manifest.uuid,
                error = %e,
                "Failed to fetch model listing from catalog"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::reader::PACKED_MAGIC;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;
    use std::time::Duration;

    fn manifest_json(uuid: &str, name: &str, languages: &[&str]) -> String {
        serde_json::json!({
            "manifest_version": "1.0",
            "name": name,
            "uuid": uuid,
            "version": "1.0.0",
            "model_architecture": "VITS2",
            "speakers": [{
                "uuid": uuid,
                "name": name,
                "supported_languages": languages,
                "icon": "data:image/png;base64,aWNvbg==",
                "styles": [{ "local_id": 0, "name": "Neutral" }]
            }]
        })
        .to_string()
    }

    fn packed_bytes(json: &str) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut out = Vec::new();
        out.extend_from_slice(&PACKED_MAGIC);
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed);
        out.extend_from_slice(b"payload");
        out
    }

    fn test_registry(dir: &Path) -> PackageRegistry {
        let catalog =
            CatalogClient::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        PackageRegistry::new(dir.to_path_buf(), "en".to_string(), catalog)
    }

    const UUID_A: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
    const UUID_B: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";

    #[tokio::test]
    async fn test_scan_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_scan_sorts_by_display_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("zed.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Zed Voices", &["en"])),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("alpha.vpkx"),
            packed_bytes(&manifest_json(UUID_B, "Alpha Voices", &["en"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].manifest.name, "Alpha Voices");
        assert_eq!(entries[1].manifest.name, "Zed Voices");
    }

    #[tokio::test]
    async fn test_duplicate_identity_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "First", &["en"])),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Second", &["en"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        assert_eq!(entries.len(), 1);
        // Stable scan order: the first file name wins
        assert_eq!(entries[0].manifest.name, "First");
    }

    #[tokio::test]
    async fn test_invalid_file_skipped_without_failing_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("junk.vpkx"), b"not a pack").unwrap();
        std::fs::write(
            dir.path().join("ok.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Good", &["en"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].manifest.name, "Good");
    }

    #[tokio::test]
    async fn test_unsupported_language_speaker_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ja.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Japanese Only", &["ja"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        // The pack is indexed; the speaker roster is just empty
        assert_eq!(entries.len(), 1);
        assert!(entries[0].speakers.is_empty());
    }

    #[tokio::test]
    async fn test_load_state_survives_rescan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Keeper", &["en"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        registry.entries(true, false).await;

        let uuid = Uuid::parse_str(UUID_A).unwrap();
        registry.set_load_state(&uuid, true).await;

        let entries = registry.entries(true, false).await;
        assert!(entries[0].is_loaded());
    }

    #[tokio::test]
    async fn test_disappeared_entry_dropped_on_rescan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.vpkx");
        std::fs::write(&path, packed_bytes(&manifest_json(UUID_A, "Gone", &["en"]))).unwrap();

        let registry = test_registry(dir.path());
        assert_eq!(registry.entries(true, false).await.len(), 1);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(registry.entries(true, false).await.len(), 0);
    }

    #[tokio::test]
    async fn test_set_load_state_unknown_identity_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        // Before any scan completed
        registry.set_load_state(&Uuid::nil(), true).await;

        registry.entries(true, false).await;
        // After a scan, still unknown
        registry.set_load_state(&Uuid::nil(), true).await;
    }

    #[tokio::test]
    async fn test_entry_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());
        let err = registry.entry(&Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, ManagerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_style_lookup_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.vpkx"),
            packed_bytes(&manifest_json(UUID_A, "Voices", &["en"])),
        )
        .unwrap();

        let registry = test_registry(dir.path());
        let entries = registry.entries(true, false).await;
        let id = entries[0].speakers[0].speaker.styles[0].id;

        let resolved = registry.style(id).await.unwrap();
        assert_eq!(resolved.style.local_id, 0);
        assert_eq!(resolved.speaker.uuid, Uuid::parse_str(UUID_A).unwrap());

        let err = registry.style(StyleId(1)).await.unwrap_err();
        assert!(matches!(err, ManagerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_install_rejects_unsupported_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());

        let json = manifest_json(UUID_A, "Exotic", &["en"]).replace("VITS2", "GradTTS");
        let err = registry.install(&packed_bytes(&json)).await.unwrap_err();
        assert!(matches!(err, ManagerError::PackageFormat(_)));
        assert!(err.to_string().contains("architecture"));
    }

    #[tokio::test]
    async fn test_install_rejects_unsupported_manifest_version() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry(dir.path());

        let json = manifest_json(UUID_A, "Future", &["en"])
            .replace("\"manifest_version\":\"1.0\"", "\"manifest_version\":\"2.0\"");
        let err = registry.install(&packed_bytes(&json)).await.unwrap_err();
        assert!(matches!(err, ManagerError::PackageFormat(_)));
        assert!(err.to_string().contains("manifest version"));
    }
}
