//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::{Uuid, uuid};

/// Voice pack installed by default when the registry comes up empty
pub const DEFAULT_MODEL_UUIDS: [Uuid; 1] = [uuid!("2f8a9c4e-5d17-4b66-8f3e-91c7a2d45b10")];

/// Main manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub api_port: u16,

    /// Directory scanned for installed voice pack files
    pub install_dir: PathBuf,

    /// Target spoken language; speakers that do not declare support for it
    /// are excluded from the index
    pub language: String,

    pub catalog_base_url: String,
    pub catalog_timeout_secs: u64,

    /// Models installed from the catalog when a scan of a fresh install
    /// directory finds nothing
    pub default_models: Vec<Uuid>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            install_dir: default_install_dir(),
            language: default_language(),
            catalog_base_url: crate::packages::DEFAULT_CATALOG_BASE_URL.to_string(),
            catalog_timeout_secs: default_catalog_timeout(),
            default_models: DEFAULT_MODEL_UUIDS.to_vec(),
        }
    }
}

impl ManagerConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(port) = std::env::var("VOICEPACK_API_PORT") {
            config.api_port = port.parse().context("Invalid VOICEPACK_API_PORT value")?;
        }
        if let Ok(dir) = std::env::var("VOICEPACK_INSTALL_DIR") {
            config.install_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("VOICEPACK_CATALOG_URL") {
            config.catalog_base_url = url;
        }
        if let Ok(language) = std::env::var("VOICEPACK_LANGUAGE") {
            config.language = language;
        }

        // The catalog URL is joined with path segments later
        config.catalog_base_url = config.catalog_base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_port < 1024 {
            anyhow::bail!("API port must be >= 1024 (got {})", self.api_port);
        }

        if self.language.is_empty() {
            anyhow::bail!("language must not be empty");
        }

        if !self.catalog_base_url.starts_with("http://")
            && !self.catalog_base_url.starts_with("https://")
        {
            anyhow::bail!(
                "catalog_base_url must be an http(s) URL (got {})",
                self.catalog_base_url
            );
        }

        if self.catalog_timeout_secs == 0 {
            anyhow::bail!("catalog_timeout_secs must be > 0");
        }

        Ok(())
    }
}

// Default functions
fn default_api_port() -> u16 {
    9000
}
fn default_language() -> String {
    "en".to_string()
}
fn default_catalog_timeout() -> u64 {
    5
}
fn default_install_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("voicepack-manager/models"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/voicepack-manager/models"))
}
