use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::errors::WorkflowErrorKind;
use crate::workflows::judging::ScoreImportError;

/// Failures of the portal process itself and of score-sheet uploads.
///
/// Workflow rule violations never land here; each workflow router renders its own error
/// type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("http server stopped: {0}")]
    Serve(#[source] std::io::Error),
    #[error("score sheet {origin}: {source}")]
    ScoreSheet {
        origin: SheetOrigin,
        #[source]
        source: ScoreImportError,
    },
}

/// Where a score sheet came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOrigin {
    File(PathBuf),
    Upload,
}

impl fmt::Display for SheetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetOrigin::File(path) => write!(f, "{}", path.display()),
            SheetOrigin::Upload => f.write_str("upload"),
        }
    }
}

impl AppError {
    pub fn score_sheet_file(path: impl Into<PathBuf>, source: ScoreImportError) -> Self {
        Self::ScoreSheet {
            origin: SheetOrigin::File(path.into()),
            source,
        }
    }

    pub fn score_sheet_upload(source: ScoreImportError) -> Self {
        Self::ScoreSheet {
            origin: SheetOrigin::Upload,
            source,
        }
    }

    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            AppError::ScoreSheet { .. } => WorkflowErrorKind::Validation,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Bind { .. }
            | AppError::Serve(_) => WorkflowErrorKind::Unavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // An unreadable sheet rejects the whole request, unlike per-row scoring failures.
        let status = match self {
            AppError::ScoreSheet { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind().label(),
        }));
        (status, body).into_response()
    }
}
