//! API request and response models

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::packages::{ModelManifest, PackageEntry, SpeakerMeta};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Request to install a pack from a URL
#[derive(Debug, Serialize, Deserialize)]
pub struct InstallFromUrlRequest {
    pub url: String,
}

/// Request to record a pack's load state
#[derive(Debug, Serialize, Deserialize)]
pub struct LoadStateRequest {
    pub is_loaded: bool,
}

/// One installed pack as exposed to callers
#[derive(Debug, Serialize)]
pub struct PackageInfo {
    pub file_path: PathBuf,
    pub file_size: u64,
    pub is_loaded: bool,
    pub is_update_available: bool,
    pub latest_version: String,
    pub manifest: ModelManifest,
    pub speakers: Vec<SpeakerMeta>,
}

impl PackageInfo {
    /// Create PackageInfo from a registry entry
    pub async fn from_entry(entry: &PackageEntry) -> Self {
        let update = entry.update_status().await;

        Self {
            file_path: entry.file_path.clone(),
            file_size: entry.file_size,
            is_loaded: entry.is_loaded(),
            is_update_available: update.update_available,
            latest_version: update.latest_version.to_string(),
            manifest: entry.manifest.clone(),
            speakers: entry.speakers.clone(),
        }
    }
}
