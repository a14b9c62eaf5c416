use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{FileUpload, Tahap, Umkm, UmkmId, UmkmRegistration};
use super::repository::MentoringRepository;
use super::service::{MentoringError, MentoringService};
use crate::workflows::actors::UserId;
use crate::workflows::errors::error_response;
use crate::workflows::notifications::NotificationPublisher;

type SharedService<M, N> = State<Arc<MentoringService<M, N>>>;

/// Router exposing UMKM registration, stage uploads and admin validation.
pub fn mentoring_router<M, N>(service: Arc<MentoringService<M, N>>) -> Router
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/umkm", post(register_handler::<M, N>))
        .route("/api/v1/umkm/:umkm_id", get(umkm_handler::<M, N>))
        .route(
            "/api/v1/umkm/:umkm_id/stages/:tahap/files",
            post(upload_files_handler::<M, N>),
        )
        .route(
            "/api/v1/umkm/:umkm_id/stages/:tahap/validation-request",
            post(request_validation_handler::<M, N>),
        )
        .route(
            "/api/v1/umkm/:umkm_id/stages/:tahap/validation",
            post(validate_handler::<M, N>),
        )
        .route(
            "/api/v1/mentoring/validation-queue",
            get(validation_queue_handler::<M, N>),
        )
        .with_state(service)
}

impl IntoResponse for MentoringError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), self.current_state())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadRequest {
    pub(crate) uploaded_by: UserId,
    pub(crate) files: Vec<FileUpload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationRequest {
    pub(crate) requested_by: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationDecision {
    pub(crate) admin_id: UserId,
    pub(crate) approved: bool,
    #[serde(default)]
    pub(crate) catatan: Option<String>,
}

fn umkm_response(result: Result<Umkm, MentoringError>) -> Response {
    match result {
        Ok(umkm) => (StatusCode::OK, Json(umkm)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn register_handler<M, N>(
    State(service): SharedService<M, N>,
    Json(registration): Json<UmkmRegistration>,
) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register(registration) {
        Ok(umkm) => (StatusCode::CREATED, Json(umkm)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn umkm_handler<M, N>(
    State(service): SharedService<M, N>,
    Path(umkm_id): Path<String>,
) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    umkm_response(service.umkm(&UmkmId(umkm_id)))
}

pub(crate) async fn upload_files_handler<M, N>(
    State(service): SharedService<M, N>,
    Path((umkm_id, tahap)): Path<(String, i64)>,
    Json(request): Json<UploadRequest>,
) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let tahap = match Tahap::try_from(tahap) {
        Ok(tahap) => tahap,
        Err(error) => return MentoringError::from(error).into_response(),
    };
    umkm_response(service.upload_files(
        &UmkmId(umkm_id),
        tahap,
        &request.uploaded_by,
        request.files,
    ))
}

pub(crate) async fn request_validation_handler<M, N>(
    State(service): SharedService<M, N>,
    Path((umkm_id, tahap)): Path<(String, i64)>,
    Json(request): Json<ValidationRequest>,
) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let tahap = match Tahap::try_from(tahap) {
        Ok(tahap) => tahap,
        Err(error) => return MentoringError::from(error).into_response(),
    };
    umkm_response(service.request_validation(&UmkmId(umkm_id), tahap, &request.requested_by))
}

pub(crate) async fn validate_handler<M, N>(
    State(service): SharedService<M, N>,
    Path((umkm_id, tahap)): Path<(String, i64)>,
    Json(decision): Json<ValidationDecision>,
) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let tahap = match Tahap::try_from(tahap) {
        Ok(tahap) => tahap,
        Err(error) => return MentoringError::from(error).into_response(),
    };
    umkm_response(service.validate(
        &UmkmId(umkm_id),
        tahap,
        &decision.admin_id,
        decision.approved,
        decision.catatan,
    ))
}

pub(crate) async fn validation_queue_handler<M, N>(State(service): SharedService<M, N>) -> Response
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.validation_queue() {
        Ok(queue) => (StatusCode::OK, Json(queue)).into_response(),
        Err(error) => error.into_response(),
    }
}
