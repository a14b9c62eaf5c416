use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::actors::UserId;
use crate::workflows::errors::RepositoryError;
use crate::workflows::memory::{MemoryNotifications, MemoryStore};
use crate::workflows::notifications::{Notification, NotificationError, NotificationPublisher};
use crate::workflows::participation::domain::{
    Business, BusinessId, Event, EventDraft, EventId, EventStatus, RegistrationRequest,
    RegistrationWindow,
};
use crate::workflows::participation::repository::ParticipationRepository;
use crate::workflows::participation::{participation_router, ParticipationService};

pub(super) type MemoryService = ParticipationService<MemoryStore, MemoryNotifications>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryStore>, Arc<MemoryNotifications>) {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(MemoryNotifications::default());
    let service =
        ParticipationService::new(store.clone(), notifications.clone(), WorkflowConfig::default());
    (service, store, notifications)
}

pub(super) fn open_window() -> RegistrationWindow {
    let now = Utc::now();
    RegistrationWindow {
        opens_at: now - Duration::days(1),
        closes_at: now + Duration::days(7),
    }
}

pub(super) fn event_draft(quota: Option<u32>) -> EventDraft {
    EventDraft {
        name: "Expo Kewirausahaan".to_string(),
        registration: open_window(),
        quota,
    }
}

/// Event moved to `TERBUKA` so it accepts registrations.
pub(super) fn open_event<R, N>(service: &ParticipationService<R, N>, quota: Option<u32>) -> Event
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let event = service.create_event(event_draft(quota)).expect("event created");
    service
        .change_event_status(&event.id, EventStatus::Terbuka)
        .expect("event opened")
}

pub(super) fn student_request() -> RegistrationRequest {
    RegistrationRequest::Mahasiswa {
        name: "Kopi Kampus".to_string(),
        owner_id: owner(),
        mentor_id: mentor(),
    }
}

pub(super) fn external_request() -> RegistrationRequest {
    RegistrationRequest::UmkmLuar {
        name: "Batik Bu Sari".to_string(),
        owner_name: "Sari Wulandari".to_string(),
        registered_by: UserId::new("admin-1"),
    }
}

pub(super) fn owner() -> UserId {
    UserId::new("mhs-001")
}

pub(super) fn mentor() -> UserId {
    UserId::new("dosen-001")
}

pub(super) fn register_student<R, N>(
    service: &ParticipationService<R, N>,
    event_id: &EventId,
) -> Business
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    service
        .register(event_id, student_request())
        .expect("student registered")
}

pub(super) fn approved_external<R, N>(
    service: &ParticipationService<R, N>,
    event_id: &EventId,
) -> Business
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let business = service
        .register(event_id, external_request())
        .expect("external registered");
    service.admin_approve(&business.id).expect("admin approves")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    participation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Publisher whose transport is always down.
#[derive(Default)]
pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ParticipationRepository for UnavailableRepository {
    fn insert_event(&self, _event: Event) -> Result<Event, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_event(&self, _event: Event, _expected: u64) -> Result<Event, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_event(&self, _id: &EventId) -> Result<Option<Event>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit_business<E, F>(
        &self,
        _business: Business,
        _expected: Option<u64>,
        _check: F,
    ) -> Result<Business, E>
    where
        F: FnOnce(&Event, &[&Business]) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn fetch_business(&self, _id: &BusinessId) -> Result<Option<Business>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn businesses_for_event(&self, _event_id: &EventId) -> Result<Vec<Business>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

type RivalWrite = Box<dyn FnOnce(&Arc<MemoryStore>) + Send>;

/// Memory store wrapper that lets a rival write land right before the next business commit,
/// after the service under test has done its reads.
pub(super) struct InterleavingRepository {
    inner: Arc<MemoryStore>,
    rival: Mutex<Option<RivalWrite>>,
}

impl InterleavingRepository {
    pub(super) fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            rival: Mutex::new(None),
        }
    }

    pub(super) fn before_next_commit(
        &self,
        write: impl FnOnce(&Arc<MemoryStore>) + Send + 'static,
    ) {
        *self.rival.lock().expect("rival mutex poisoned") = Some(Box::new(write));
    }
}

impl ParticipationRepository for InterleavingRepository {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError> {
        self.inner.insert_event(event)
    }

    fn update_event(&self, event: Event, expected: u64) -> Result<Event, RepositoryError> {
        self.inner.update_event(event, expected)
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        self.inner.fetch_event(id)
    }

    fn commit_business<E, F>(
        &self,
        business: Business,
        expected: Option<u64>,
        check: F,
    ) -> Result<Business, E>
    where
        F: FnOnce(&Event, &[&Business]) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let rival = self.rival.lock().expect("rival mutex poisoned").take();
        if let Some(write) = rival {
            write(&self.inner);
        }
        self.inner.commit_business(business, expected, check)
    }

    fn fetch_business(&self, id: &BusinessId) -> Result<Option<Business>, RepositoryError> {
        self.inner.fetch_business(id)
    }

    fn businesses_for_event(&self, event_id: &EventId) -> Result<Vec<Business>, RepositoryError> {
        self.inner.businesses_for_event(event_id)
    }
}

pub(super) type InterleavedService =
    ParticipationService<InterleavingRepository, MemoryNotifications>;

pub(super) fn build_interleaved_service(
) -> (InterleavedService, Arc<InterleavingRepository>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let repository = Arc::new(InterleavingRepository::new(store.clone()));
    let service = ParticipationService::new(
        repository.clone(),
        Arc::new(MemoryNotifications::default()),
        WorkflowConfig::default(),
    );
    (service, repository, store)
}

/// A second service writing straight to `store`, standing in for a concurrent request.
pub(super) fn rival_service(store: &Arc<MemoryStore>) -> MemoryService {
    ParticipationService::new(
        store.clone(),
        Arc::new(MemoryNotifications::default()),
        WorkflowConfig::default(),
    )
}
