use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};

/// Coarse classification every workflow error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowErrorKind {
    Validation,
    InvalidTransition,
    Locked,
    NotFound,
    Forbidden,
    Conflict,
    Unavailable,
}

impl WorkflowErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Locked => "LOCKED",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Unavailable => "UNAVAILABLE",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidTransition | Self::Conflict => StatusCode::CONFLICT,
            Self::Locked => StatusCode::LOCKED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Storage failures shared by every workflow repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} {id} was modified by another request; reload and retry")]
    StaleRecord { entity: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn stale(entity: &'static str, id: impl Into<String>) -> Self {
        Self::StaleRecord {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            RepositoryError::Conflict | RepositoryError::StaleRecord { .. } => {
                WorkflowErrorKind::Conflict
            }
            RepositoryError::NotFound { .. } => WorkflowErrorKind::NotFound,
            RepositoryError::Unavailable(_) => WorkflowErrorKind::Unavailable,
        }
    }
}

/// JSON error body: `{"error", "kind", "current"?}`.
pub(crate) fn error_response(
    kind: WorkflowErrorKind,
    message: String,
    current: Option<Value>,
) -> Response {
    let mut payload = json!({
        "error": message,
        "kind": kind.label(),
    });
    if let Some(current) = current {
        payload["current"] = current;
    }
    (kind.status_code(), axum::Json(payload)).into_response()
}
