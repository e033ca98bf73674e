//! Voice pack container parsing
//!
//! A pack file embeds its manifest at the head of the file in one of two
//! container variants:
//!
//! - packed (`.vpkx`): `b"VPKX"` magic, little-endian u32 length, then a
//!   zlib-compressed JSON manifest, then the opaque model payload
//! - legacy (`.vpk`): little-endian u64 length, then the raw JSON
//!   manifest, then the opaque model payload
//!
//! The reader tries the packed variant first and falls back to legacy,
//! recording which one succeeded so re-writes can pick the matching
//! extension. Parsing is a pure function over bytes; the reader never
//! touches the filesystem.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{ManagerError, Result};
use crate::packages::manifest::ModelManifest;

pub const PACKED_MAGIC: [u8; 4] = *b"VPKX";

/// Container variant a pack was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    Packed,
    Legacy,
}

impl PackageFormat {
    /// On-disk extension for this variant
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Packed => "vpkx",
            Self::Legacy => "vpk",
        }
    }

    /// Whether a file name carries one of the recognized extensions
    pub fn matches_path(path: &std::path::Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("vpkx") | Some("vpk")
        )
    }
}

/// Parse a voice pack, trying the packed container first and falling back
/// to the legacy one
pub fn read_package(bytes: &[u8]) -> Result<(ModelManifest, PackageFormat)> {
    let packed_err = match read_packed(bytes) {
        Ok(manifest) => return Ok((manifest, PackageFormat::Packed)),
        Err(err) => err,
    };
    match read_legacy(bytes) {
        Ok(manifest) => Ok((manifest, PackageFormat::Legacy)),
        Err(legacy_err) => Err(ManagerError::PackageFormat(format!(
            "not a packed pack ({packed_err}) and not a legacy pack ({legacy_err})"
        ))),
    }
}

fn read_packed(bytes: &[u8]) -> std::result::Result<ModelManifest, String> {
    if bytes.len() < 8 {
        return Err("file is shorter than the packed header".to_string());
    }
    if bytes[0..4] != PACKED_MAGIC {
        return Err("missing VPKX magic".to_string());
    }

    let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let manifest_bytes = bytes
        .get(8..8 + len)
        .ok_or_else(|| format!("declared manifest length {len} exceeds file size"))?;

    let mut decoder = ZlibDecoder::new(manifest_bytes);
    let mut json = String::new();
    decoder
        .read_to_string(&mut json)
        .map_err(|e| format!("manifest block is not valid zlib data: {e}"))?;

    parse_manifest(&json)
}

fn read_legacy(bytes: &[u8]) -> std::result::Result<ModelManifest, String> {
    if bytes.len() < 8 {
        return Err("file is shorter than the legacy header".to_string());
    }

    let len = u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]) as usize;
    let manifest_bytes = bytes
        .get(8..8usize.saturating_add(len))
        .ok_or_else(|| format!("declared manifest length {len} exceeds file size"))?;

    let json = std::str::from_utf8(manifest_bytes)
        .map_err(|e| format!("manifest block is not valid UTF-8: {e}"))?;

    parse_manifest(json)
}

fn parse_manifest(json: &str) -> std::result::Result<ModelManifest, String> {
    let manifest: ModelManifest =
        serde_json::from_str(json).map_err(|e| format!("manifest JSON is invalid: {e}"))?;
    manifest.validate()?;
    Ok(manifest)
}
