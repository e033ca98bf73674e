//! VoiceHub catalog client
//!
//! Fetches per-model listings (for update checks) and pack files (for
//! installs) from the remote catalog. Every request carries a descriptive
//! User-Agent and a bounded timeout; reconciliation callers treat every
//! failure as non-fatal.

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ManagerError, Result};

/// Production catalog API base URL
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.voicehub.dev/v1";

/// Prefix of human-facing model detail pages; install-from-URL rewrites
/// these to the direct download endpoint
pub const CATALOG_PAGE_URL_PREFIX: &str = "https://hub.voicehub.dev/models/";

/// Format tag of the packed container in catalog listings
pub const PACKED_MODEL_TYPE: &str = "VPKX";

/// One model's listing on the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct ModelListing {
    /// Available file variants; the packed one carries the version the
    /// registry compares against
    pub model_files: Vec<ModelFileVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelFileVariant {
    pub model_type: String,
    pub version: String,
}

impl ModelListing {
    /// Version string of the packed variant, if the catalog lists one
    pub fn packed_version(&self) -> Option<&str> {
        self.model_files
            .iter()
            .find(|f| f.model_type == PACKED_MODEL_TYPE)
            .map(|f| f.version.as_str())
    }
}

/// HTTP client for the VoiceHub catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|e| ManagerError::Download(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    /// Direct download URL of a model's packed pack file
    pub fn download_url(&self, uuid: &Uuid) -> String {
        format!(
            "{}/models/{}/download?model_type={}",
            self.base_url, uuid, PACKED_MODEL_TYPE
        )
    }

    /// Rewrite a catalog model-page URL to the direct download endpoint;
    /// any other URL passes through untouched
    pub fn resolve_download_url(&self, url: &str) -> Result<String> {
        let Some(rest) = url.strip_prefix(CATALOG_PAGE_URL_PREFIX) else {
            return Ok(url.to_string());
        };

        let identity = rest.split(['/', '?']).next().unwrap_or_default();
        let uuid = Uuid::parse_str(identity).map_err(|_| {
            ManagerError::InvalidArgument(format!(
                "catalog page URL does not contain a model identity: {url}"
            ))
        })?;

        let download_url = self.download_url(&uuid);
        tracing::info!(url = %download_url, "Detected catalog model page URL, using download API");
        Ok(download_url)
    }

    /// Fetch one model's listing
    ///
    /// Returns `Ok(None)` on 404 (the model is simply not listed on the
    /// catalog); every other failure is an error the caller is expected to
    /// log and swallow.
    pub async fn model_listing(&self, uuid: &Uuid) -> Result<Option<ModelListing>> {
        let url = format!("{}/models/{}", self.base_url, uuid);

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ManagerError::Download(format!("GET {url}: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ManagerError::Download(format!(
                "GET {url}: HTTP {}",
                response.status()
            )));
        }

        let listing = response
            .json::<ModelListing>()
            .await
            .map_err(|e| ManagerError::Download(format!("GET {url}: malformed listing: {e}")))?;
        Ok(Some(listing))
    }

    /// Download raw bytes, following redirects
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!(url = %url, "Downloading voice pack");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ManagerError::Download(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(ManagerError::Download(format!(
                "GET {url}: HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ManagerError::Download(format!("GET {url}: {e}")))?;

        tracing::info!(url = %url, bytes = bytes.len(), "Downloaded voice pack");
        Ok(bytes.to_vec())
    }
}

/// Descriptive User-Agent sent on every catalog request
pub fn user_agent() -> String {
    format!("voicepack-manager/{}", env!("CARGO_PKG_VERSION"))
}
