//! voicepack-manager - Local voice pack registry
//!
//! A lightweight Rust service that manages a local collection of installable
//! speech-synthesis voice packs and keeps their update status synchronized
//! with the VoiceHub catalog.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod packages;

pub use config::ManagerConfig;
pub use error::{ManagerError, Result, StorageKind};
pub use packages::{
    CatalogClient, ModelManifest, PackageEntry, PackageFormat, PackageRegistry, StyleId,
};
