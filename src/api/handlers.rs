//! API request handlers

use super::models::{HealthResponse, InstallFromUrlRequest, LoadStateRequest, PackageInfo};
use super::routes::AppState;
use crate::error::ManagerError;
use crate::packages::{ResolvedStyle, Speaker, SpeakerDetail, StyleId};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// GET /health - Manager health check
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

#[derive(Debug, Deserialize)]
pub struct ListModelsQuery {
    /// Force a rescan of the install directory
    #[serde(default)]
    pub refresh: bool,
    /// Block until the catalog update check completes
    #[serde(default)]
    pub wait: bool,
}

/// GET /models - All installed packs, keyed by identity, sorted by name
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ListModelsQuery>,
) -> Result<Json<serde_json::Map<String, serde_json::Value>>, ManagerError> {
    let entries = state.registry.entries(query.refresh, query.wait).await;

    let mut models = serde_json::Map::new();
    for entry in entries.iter() {
        let info = PackageInfo::from_entry(entry).await;
        let value =
            serde_json::to_value(info).map_err(|e| ManagerError::Internal(e.into()))?;
        models.insert(entry.manifest.uuid.to_string(), value);
    }

    crate::metrics::update_installed_count(models.len());

    Ok(Json(models))
}

/// GET /models/{uuid} - Single installed pack
pub async fn get_model(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<PackageInfo>, ManagerError> {
    let entry = state.registry.entry(&uuid).await?;
    Ok(Json(PackageInfo::from_entry(&entry).await))
}

/// POST /models/install - Install a pack from the request body
pub async fn install_model(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ManagerError> {
    let uuid = state.registry.install(&body).await?;

    crate::metrics::record_pack_installed(&uuid.to_string());
    crate::metrics::update_installed_count(state.registry.entries(false, false).await.len());

    Ok(StatusCode::NO_CONTENT)
}

/// POST /models/install_from_url - Download a pack and install it
pub async fn install_model_from_url(
    State(state): State<AppState>,
    Json(req): Json<InstallFromUrlRequest>,
) -> Result<StatusCode, ManagerError> {
    let uuid = state.registry.install_from_url(&req.url).await?;

    crate::metrics::record_pack_installed(&uuid.to_string());
    crate::metrics::update_installed_count(state.registry.entries(false, false).await.len());

    Ok(StatusCode::NO_CONTENT)
}

/// POST /models/{uuid}/update - Install the newest catalog version
pub async fn update_model(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<StatusCode, ManagerError> {
    state.registry.update(&uuid).await?;

    crate::metrics::record_pack_updated(&uuid.to_string());

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /models/{uuid} - Uninstall a pack
pub async fn uninstall_model(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<StatusCode, ManagerError> {
    state.registry.uninstall(&uuid).await?;

    crate::metrics::record_pack_uninstalled(&uuid.to_string());
    crate::metrics::update_installed_count(state.registry.entries(false, false).await.len());

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /models/{uuid}/load_state - Record engine load state
///
/// A no-op for unknown identities: the engine may report load changes
/// before the first scan completes
pub async fn set_load_state(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(req): Json<LoadStateRequest>,
) -> StatusCode {
    state.registry.set_load_state(&uuid, req.is_loaded).await;
    StatusCode::NO_CONTENT
}

/// GET /speakers - All speakers across installed packs
pub async fn list_speakers(State(state): State<AppState>) -> Json<Vec<Speaker>> {
    Json(state.registry.speakers().await)
}

/// GET /speakers/{uuid}/detail - Additional speaker display metadata
pub async fn speaker_detail(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<SpeakerDetail>, ManagerError> {
    Ok(Json(state.registry.speaker_detail(&uuid).await?))
}

/// GET /styles/{style_id} - Resolve a global style identifier
pub async fn get_style(
    State(state): State<AppState>,
    Path(style_id): Path<i32>,
) -> Result<Json<ResolvedStyle>, ManagerError> {
    Ok(Json(state.registry.style(StyleId(style_id)).await?))
}
