//! Error types for registry operations and API responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::packages::StyleId;

/// Category of a storage failure, used to pick a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    OutOfSpace,
    PermissionDenied,
    ReadOnly,
    Other,
}

/// Errors produced by the package registry and its collaborators
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The bytes are not a valid voice pack, or the pack declares an
    /// unsupported manifest version or model architecture
    #[error("invalid voice pack: {0}")]
    PackageFormat(String),

    /// Unknown model, speaker, or style identity
    #[error("{0}")]
    NotFound(String),

    #[error("model {0} has no update available")]
    NoUpdateAvailable(Uuid),

    /// Uninstall would leave the registry empty
    #[error("at least one voice pack must remain installed")]
    MinimumCardinality,

    /// Network or transport failure while talking to the catalog
    #[error("download failed: {0}")]
    Download(String),

    /// Filesystem failure while writing or deleting a pack file
    #[error("{message}")]
    Storage { kind: StorageKind, message: String },

    /// Caller violated a precondition (codec bounds, malformed URL)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ManagerError>;

impl ManagerError {
    pub fn model_not_found(uuid: &Uuid) -> Self {
        Self::NotFound(format!("model {uuid} is not installed"))
    }

    pub fn speaker_not_found(uuid: &Uuid) -> Self {
        Self::NotFound(format!("speaker {uuid} is not installed"))
    }

    pub fn style_not_found(id: StyleId) -> Self {
        Self::NotFound(format!("style {id} does not exist"))
    }

    /// Classify a filesystem failure into a user-facing storage category,
    /// keeping the original error as diagnostic detail
    pub fn storage(err: std::io::Error, context: &str) -> Self {
        use std::io::ErrorKind;

        let (kind, reason) = match err.kind() {
            ErrorKind::StorageFull => (StorageKind::OutOfSpace, "storage is full"),
            ErrorKind::PermissionDenied => (StorageKind::PermissionDenied, "permission denied"),
            ErrorKind::ReadOnlyFilesystem => (StorageKind::ReadOnly, "the target is read-only"),
            _ => (StorageKind::Other, "I/O error"),
        };

        Self::Storage {
            kind,
            message: format!("{context}: {reason} ({err})"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::PackageFormat(_) | Self::NoUpdateAvailable(_) | Self::InvalidArgument(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MinimumCardinality => StatusCode::BAD_REQUEST,
            Self::Download(_) | Self::Storage { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ManagerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ManagerError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error: message,
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}
