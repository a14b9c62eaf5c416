use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{CategoryDraft, CategoryId, CriterionDraft, ScoreSubmission};
use super::import::ScoreSheetImporter;
use super::repository::JudgingRepository;
use super::service::{JudgingError, JudgingService};
use crate::error::AppError;
use crate::workflows::actors::UserId;
use crate::workflows::errors::error_response;
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::participation::domain::{BusinessId, EventId};
use crate::workflows::participation::repository::ParticipationRepository;

type SharedService<J, P, N> = State<Arc<JudgingService<J, P, N>>>;

/// Router exposing the category catalog, scoring, ranking and winner selection.
pub fn judging_router<J, P, N>(service: Arc<JudgingService<J, P, N>>) -> Router
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/events/:event_id/categories",
            post(create_category_handler::<J, P, N>).get(list_categories_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id",
            get(category_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/criteria",
            put(replace_criteria_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/criteria/validation",
            get(validate_criteria_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/evaluators",
            put(assign_evaluators_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/scores",
            put(submit_scores_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/score-sheet",
            put(import_score_sheet_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/ranking",
            get(ranking_handler::<J, P, N>),
        )
        .route(
            "/api/v1/categories/:category_id/winner",
            put(set_winner_handler::<J, P, N>).delete(revoke_winner_handler::<J, P, N>),
        )
        .with_state(service)
}

impl IntoResponse for JudgingError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), self.current_state())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CriteriaRequest {
    pub(crate) criteria: Vec<CriterionDraft>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluatorsRequest {
    pub(crate) evaluators: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoresRequest {
    pub(crate) evaluator_id: UserId,
    pub(crate) scores: Vec<ScoreSubmission>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreSheetRequest {
    pub(crate) evaluator_id: UserId,
    pub(crate) csv: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WinnerRequest {
    pub(crate) business_id: BusinessId,
    pub(crate) selected_by: UserId,
}

pub(crate) async fn create_category_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(event_id): Path<String>,
    Json(draft): Json<CategoryDraft>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_category(&EventId(event_id), draft) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_categories_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(event_id): Path<String>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.categories(&EventId(event_id)) {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn category_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.category(&CategoryId(category_id)) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn replace_criteria_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
    Json(request): Json<CriteriaRequest>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.replace_criteria(&CategoryId(category_id), request.criteria) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn validate_criteria_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.validate_criteria(&CategoryId(category_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn assign_evaluators_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
    Json(request): Json<EvaluatorsRequest>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.assign_evaluators(&CategoryId(category_id), request.evaluators) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn submit_scores_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
    Json(request): Json<ScoresRequest>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit_scores(
        &CategoryId(category_id),
        &request.evaluator_id,
        request.scores,
    ) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn import_score_sheet_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
    Json(request): Json<ScoreSheetRequest>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let submissions = match ScoreSheetImporter::from_reader(request.csv.as_bytes()) {
        Ok(submissions) => submissions,
        Err(error) => return AppError::score_sheet_upload(error).into_response(),
    };

    match service.submit_scores(&CategoryId(category_id), &request.evaluator_id, submissions) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn ranking_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.ranking(&CategoryId(category_id)) {
        Ok(ranking) => (StatusCode::OK, Json(ranking)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn set_winner_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
    Json(request): Json<WinnerRequest>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.set_winner(
        &CategoryId(category_id),
        &request.business_id,
        &request.selected_by,
    ) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn revoke_winner_handler<J, P, N>(
    State(service): SharedService<J, P, N>,
    Path(category_id): Path<String>,
) -> Response
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.revoke_winner(&CategoryId(category_id)) {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(error) => error.into_response(),
    }
}
