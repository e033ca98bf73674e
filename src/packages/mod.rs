//! Voice pack management module
//!
//! Provides functionality for:
//! - Parsing voice pack containers (packed and legacy) into manifests
//! - Encoding globally unique style identifiers
//! - Scanning, indexing, and installing packs from the install directory
//! - Reconciling update status against the VoiceHub catalog

pub mod catalog;
pub mod manifest;
pub mod reader;
pub mod registry;
pub mod style_id;

pub use catalog::{CatalogClient, DEFAULT_CATALOG_BASE_URL, ModelListing};
pub use manifest::{
    ManifestSpeaker, ManifestStyle, ModelArchitecture, ModelManifest, VoiceSample,
};
pub use reader::{PackageFormat, read_package};
pub use registry::{
    PackageEntry, PackageRegistry, ResolvedStyle, Snapshot, Speaker, SpeakerDetail, SpeakerMeta,
    SpeakerStyle, StyleDetail, UpdateStatus,
};
pub use style_id::{MAX_LOCAL_INDEX, StyleId};
