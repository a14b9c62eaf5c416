use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    Business, BusinessId, BusinessView, EventDraft, EventId, EventStatus, RegistrationRequest,
};
use super::repository::ParticipationRepository;
use super::service::{ParticipationError, ParticipationService};
use crate::workflows::actors::UserId;
use crate::workflows::errors::error_response;
use crate::workflows::notifications::NotificationPublisher;

type SharedService<R, N> = State<Arc<ParticipationService<R, N>>>;

/// Router exposing event administration and the business approval workflow.
pub fn participation_router<R, N>(service: Arc<ParticipationService<R, N>>) -> Router
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/events", post(create_event_handler::<R, N>))
        .route("/api/v1/events/:event_id", get(event_handler::<R, N>))
        .route(
            "/api/v1/events/:event_id/status",
            put(event_status_handler::<R, N>),
        )
        .route(
            "/api/v1/events/:event_id/lock",
            put(event_lock_handler::<R, N>),
        )
        .route(
            "/api/v1/events/:event_id/businesses",
            post(register_handler::<R, N>).get(list_businesses_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id",
            get(business_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/mentor-approval",
            post(mentor_approve_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/mentor-rejection",
            post(mentor_reject_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/admin-approval",
            post(admin_approve_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/admin-rejection",
            post(admin_reject_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/booth",
            put(assign_booth_handler::<R, N>),
        )
        .route(
            "/api/v1/businesses/:business_id/cancellation",
            post(cancel_handler::<R, N>),
        )
        .with_state(service)
}

impl IntoResponse for ParticipationError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string(), self.current_state())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventStatusRequest {
    pub(crate) status: EventStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventLockRequest {
    pub(crate) locked: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MentorDecisionRequest {
    pub(crate) mentor_id: UserId,
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AdminDecisionRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BoothRequest {
    pub(crate) booth_number: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancellationRequest {
    pub(crate) requested_by: UserId,
}

fn business_response(result: Result<Business, ParticipationError>) -> Response {
    match result {
        Ok(business) => (StatusCode::OK, Json(business.view())).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn create_event_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(draft): Json<EventDraft>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_event(draft) {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn event_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(event_id): Path<String>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.event(&EventId(event_id)) {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn event_status_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(event_id): Path<String>,
    Json(request): Json<EventStatusRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.change_event_status(&EventId(event_id), request.status) {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn event_lock_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(event_id): Path<String>,
    Json(request): Json<EventLockRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.set_event_lock(&EventId(event_id), request.locked) {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn register_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(event_id): Path<String>,
    Json(request): Json<RegistrationRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register(&EventId(event_id), request) {
        Ok(business) => (StatusCode::CREATED, Json(business.view())).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_businesses_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(event_id): Path<String>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.businesses(&EventId(event_id)) {
        Ok(businesses) => {
            let views: Vec<BusinessView> = businesses.iter().map(Business::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn business_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.business(&BusinessId(business_id)))
}

pub(crate) async fn mentor_approve_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
    Json(request): Json<MentorDecisionRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.mentor_approve(&BusinessId(business_id), &request.mentor_id))
}

pub(crate) async fn mentor_reject_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
    Json(request): Json<MentorDecisionRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.mentor_reject(
        &BusinessId(business_id),
        &request.mentor_id,
        request.reason,
    ))
}

pub(crate) async fn admin_approve_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.admin_approve(&BusinessId(business_id)))
}

pub(crate) async fn admin_reject_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
    Json(request): Json<AdminDecisionRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.admin_reject(&BusinessId(business_id), request.reason))
}

pub(crate) async fn assign_booth_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
    Json(request): Json<BoothRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.assign_booth(&BusinessId(business_id), &request.booth_number))
}

pub(crate) async fn cancel_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(business_id): Path<String>,
    Json(request): Json<CancellationRequest>,
) -> Response
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    business_response(service.cancel(&BusinessId(business_id), &request.requested_by))
}
