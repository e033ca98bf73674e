//! Voice pack manifest types
//!
//! The manifest is the structured metadata block embedded in every pack
//! file: model identity, semantic version, architecture, and the roster of
//! speakers and their styles. It is immutable once parsed; all runtime
//! state lives on the registry entry instead.

use semver::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ManagerError, Result};
use crate::packages::style_id::MAX_LOCAL_INDEX;

/// Manifest versions this build can read
pub const SUPPORTED_MANIFEST_VERSIONS: &[&str] = &["1.0"];

/// Model architecture tag declared by a pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelArchitecture {
    #[serde(rename = "VITS2")]
    Vits2,
    #[serde(rename = "VITS2-Extended")]
    Vits2Extended,
    /// Anything this build does not know how to synthesize with
    #[serde(untagged)]
    Other(String),
}

impl ModelArchitecture {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Vits2 | Self::Vits2Extended)
    }
}

impl std::fmt::Display for ModelArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vits2 => write!(f, "VITS2"),
            Self::Vits2Extended => write!(f, "VITS2-Extended"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// Top-level pack manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Declared manifest format version, `major.minor`
    pub manifest_version: String,
    /// Model display name
    pub name: String,
    /// Model identity; unique across the installed collection
    pub uuid: Uuid,
    pub version: Version,
    pub model_architecture: ModelArchitecture,
    #[serde(default)]
    pub license: Option<String>,
    pub speakers: Vec<ManifestSpeaker>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSpeaker {
    pub uuid: Uuid,
    pub name: String,
    pub supported_languages: Vec<String>,
    /// Speaker icon as a data URL
    pub icon: String,
    pub styles: Vec<ManifestStyle>,
}

impl ManifestSpeaker {
    /// Whether this speaker declares support for the given spoken language.
    /// Tags are matched on the primary subtag, case-insensitively, so a
    /// target of `en` accepts both `en` and `en-US`.
    pub fn supports_language(&self, language: &str) -> bool {
        let language = language.to_lowercase();
        self.supported_languages.iter().any(|tag| {
            let tag = tag.to_lowercase();
            tag == language || tag.starts_with(&format!("{language}-"))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStyle {
    /// Style index local to the owning speaker, 0..=31
    pub local_id: u32,
    pub name: String,
    /// Optional icon override as a data URL; the speaker icon is used when
    /// absent
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub voice_samples: Vec<VoiceSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSample {
    /// Audio as a data URL
    pub audio: String,
    pub transcript: String,
}

impl ModelManifest {
    /// Structural validation beyond what serde enforces.
    /// Called by the package reader after deserialization.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let parts: Vec<&str> = self.manifest_version.split('.').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.parse::<u32>().is_err()) {
            return Err(format!(
                "manifest_version {:?} is not of the form major.minor",
                self.manifest_version
            ));
        }

        if self.name.is_empty() {
            return Err("model name is empty".to_string());
        }

        if self.speakers.is_empty() {
            return Err("manifest declares no speakers".to_string());
        }

        for speaker in &self.speakers {
            if speaker.styles.is_empty() {
                return Err(format!("speaker {} declares no styles", speaker.uuid));
            }

            let mut seen = std::collections::HashSet::new();
            for style in &speaker.styles {
                if style.local_id > MAX_LOCAL_INDEX {
                    return Err(format!(
                        "speaker {}: style local_id {} is out of range 0..={}",
                        speaker.uuid, style.local_id, MAX_LOCAL_INDEX
                    ));
                }
                if !seen.insert(style.local_id) {
                    return Err(format!(
                        "speaker {}: duplicate style local_id {}",
                        speaker.uuid, style.local_id
                    ));
                }
            }
        }

        Ok(())
    }

    /// Major component of the declared manifest version.
    /// Only call after `validate()` has passed.
    pub fn manifest_major(&self) -> u32 {
        self.manifest_version
            .split('.')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the declared manifest version is readable by this build.
    /// A same-major newer minor is readable; the caller is expected to warn.
    pub fn manifest_version_supported(&self) -> bool {
        let supported_major = SUPPORTED_MANIFEST_VERSIONS[0]
            .split('.')
            .next()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        self.manifest_major() == supported_major
    }

    /// Whether the version is listed exactly, as opposed to merely
    /// major-compatible
    pub fn manifest_version_listed(&self) -> bool {
        SUPPORTED_MANIFEST_VERSIONS.contains(&self.manifest_version.as_str())
    }
}

/// Extract the base64 payload from a data URL
pub fn data_url_base64(data_url: &str) -> Result<String> {
    if data_url.is_empty() {
        return Err(ManagerError::PackageFormat("data URL is empty".to_string()));
    }
    if !data_url.starts_with("data:") {
        return Err(ManagerError::PackageFormat(
            "invalid data URL format".to_string(),
        ));
    }
    match data_url.split_once(',') {
        Some((_, base64)) => Ok(base64.to_string()),
        None => Err(ManagerError::PackageFormat(
            "invalid data URL format".to_string(),
        )),
    }
}
