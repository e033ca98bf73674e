//! Shared helpers for integration tests: voice pack builders and an
//! in-process catalog stub.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Manifest JSON for a single-speaker English pack
pub fn manifest_json(uuid: &str, name: &str, version: &str) -> String {
    serde_json::json!({
        "manifest_version": "1.0",
        "name": name,
        "uuid": uuid,
        "version": version,
        "model_architecture": "VITS2",
        "license": "CC0",
        "speakers": [{
            "uuid": uuid,
            "name": name,
            "supported_languages": ["en", "en-US"],
            "icon": "data:image/png;base64,aWNvbg==",
            "styles": [
                { "local_id": 0, "name": "Neutral" },
                {
                    "local_id": 1,
                    "name": "Cheerful",
                    "voice_samples": [
                        { "audio": "data:audio/wav;base64,c2FtcGxl", "transcript": "Hello." }
                    ]
                }
            ]
        }]
    })
    .to_string()
}

/// Build a packed (`.vpkx`) container around a manifest
pub fn packed_pack(manifest_json: &str) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(manifest_json.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut out = Vec::new();
    out.extend_from_slice(b"VPKX");
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    out.extend_from_slice(&compressed);
    out.extend_from_slice(b"model-payload");
    out
}

/// Build a legacy (`.vpk`) container around a manifest
pub fn legacy_pack(manifest_json: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(manifest_json.len() as u64).to_le_bytes());
    out.extend_from_slice(manifest_json.as_bytes());
    out.extend_from_slice(b"model-payload");
    out
}

/// In-process VoiceHub catalog stub
///
/// Serves `GET /models/{uuid}` from `listings` and
/// `GET /models/{uuid}/download` from `downloads`; unknown identities 404.
/// A per-identity delay simulates a slow or hanging catalog.
#[derive(Clone, Default)]
pub struct CatalogStub {
    listings: Arc<Mutex<HashMap<Uuid, serde_json::Value>>>,
    downloads: Arc<Mutex<HashMap<Uuid, Vec<u8>>>>,
    delays: Arc<Mutex<HashMap<Uuid, Duration>>>,
}

impl CatalogStub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a listing whose packed variant carries the given version
    pub fn set_listing(&self, uuid: Uuid, version: &str) {
        self.listings.lock().unwrap().insert(
            uuid,
            serde_json::json!({
                "model_files": [
                    { "model_type": "SOURCE", "version": "99.0.0" },
                    { "model_type": "VPKX", "version": version }
                ]
            }),
        );
    }

    /// Serve an arbitrary listing body (for malformed-response tests)
    pub fn set_raw_listing(&self, uuid: Uuid, value: serde_json::Value) {
        self.listings.lock().unwrap().insert(uuid, value);
    }

    pub fn set_download(&self, uuid: Uuid, bytes: Vec<u8>) {
        self.downloads.lock().unwrap().insert(uuid, bytes);
    }

    pub fn set_delay(&self, uuid: Uuid, delay: Duration) {
        self.delays.lock().unwrap().insert(uuid, delay);
    }

    /// Bind to an ephemeral port and serve in the background; returns the
    /// base URL to hand to a `CatalogClient`
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/models/{uuid}", get(get_listing))
            .route("/models/{uuid}/download", get(get_download))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind catalog stub");
        let addr = listener.local_addr().expect("no local addr");

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{addr}")
    }

    async fn sleep_if_delayed(&self, uuid: &Uuid) {
        let delay = self.delays.lock().unwrap().get(uuid).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn get_listing(
    State(stub): State<CatalogStub>,
    Path(uuid): Path<Uuid>,
) -> axum::response::Response {
    stub.sleep_if_delayed(&uuid).await;

    let listing = stub.listings.lock().unwrap().get(&uuid).cloned();
    match listing {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_download(
    State(stub): State<CatalogStub>,
    Path(uuid): Path<Uuid>,
) -> axum::response::Response {
    stub.sleep_if_delayed(&uuid).await;

    let bytes = stub.downloads.lock().unwrap().get(&uuid).cloned();
    match bytes {
        Some(bytes) => (StatusCode::OK, bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
