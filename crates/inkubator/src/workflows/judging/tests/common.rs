use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::actors::UserId;
use crate::workflows::errors::RepositoryError;
use crate::workflows::judging::domain::{
    AssessmentCategory, CategoryDraft, CategoryId, CriterionDraft, CriterionId, Score, ScoreKey,
    ScoreSubmission,
};
use crate::workflows::judging::{JudgingRepository, JudgingService, ScoreScope};
use crate::workflows::memory::{MemoryNotifications, MemoryStore};
use crate::workflows::participation::domain::{
    Business, BusinessId, Event, EventDraft, EventId, EventStatus, RegistrationRequest,
    RegistrationWindow,
};
use crate::workflows::participation::ParticipationService;

pub(super) type Participation = ParticipationService<MemoryStore, MemoryNotifications>;
pub(super) type Judging = JudgingService<MemoryStore, MemoryStore, MemoryNotifications>;

pub(super) struct Fixture {
    pub(super) participation: Participation,
    pub(super) judging: Judging,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) event: Event,
}

pub(super) fn fixture() -> Fixture {
    fixture_on(Arc::new(MemoryStore::new()))
}

fn fixture_on(store: Arc<MemoryStore>) -> Fixture {
    let notifications = Arc::new(MemoryNotifications::default());
    let participation = ParticipationService::new(
        store.clone(),
        notifications.clone(),
        WorkflowConfig::default(),
    );
    let judging = JudgingService::new(store.clone(), store, notifications.clone());

    let now = Utc::now();
    let event = participation
        .create_event(EventDraft {
            name: "Expo Produk Inovasi".to_string(),
            registration: RegistrationWindow {
                opens_at: now - Duration::days(2),
                closes_at: now + Duration::days(2),
            },
            quota: None,
        })
        .expect("event created");
    let event = participation
        .change_event_status(&event.id, EventStatus::Terbuka)
        .expect("opened");

    Fixture {
        participation,
        judging,
        notifications,
        event,
    }
}

impl Fixture {
    /// Register and admin-approve an external business.
    pub(super) fn approved_business(&self, name: &str) -> Business {
        let business = self
            .participation
            .register(
                &self.event.id,
                RegistrationRequest::UmkmLuar {
                    name: name.to_string(),
                    owner_name: format!("Pemilik {name}"),
                    registered_by: UserId::new("admin-1"),
                },
            )
            .expect("registered");
        self.participation
            .admin_approve(&business.id)
            .expect("approved")
    }

    pub(super) fn pending_business(&self, name: &str) -> Business {
        self.participation
            .register(
                &self.event.id,
                RegistrationRequest::UmkmLuar {
                    name: name.to_string(),
                    owner_name: format!("Pemilik {name}"),
                    registered_by: UserId::new("admin-1"),
                },
            )
            .expect("registered")
    }

    pub(super) fn start_event(&self) {
        self.participation
            .change_event_status(&self.event.id, EventStatus::Berlangsung)
            .expect("event running");
    }

    pub(super) fn finish_event(&self) {
        self.participation
            .change_event_status(&self.event.id, EventStatus::Selesai)
            .expect("event finished");
    }

    pub(super) fn lock_event(&self, locked: bool) {
        self.participation
            .set_event_lock(&self.event.id, locked)
            .expect("lock toggled");
    }

    pub(super) fn category(&self, weights: &[(&str, i64)]) -> AssessmentCategory {
        self.judging
            .create_category(
                &self.event.id,
                CategoryDraft {
                    name: "Produk Terbaik".to_string(),
                    criteria: drafts(weights),
                    evaluators: vec![judge()],
                },
            )
            .expect("category created")
    }
}

pub(super) fn drafts(weights: &[(&str, i64)]) -> Vec<CriterionDraft> {
    weights
        .iter()
        .map(|(id, weight)| CriterionDraft {
            id: Some(CriterionId(id.to_string())),
            name: format!("Kriteria {id}"),
            weight: *weight,
        })
        .collect()
}

pub(super) fn judge() -> UserId {
    UserId::new("dosen-juri")
}

pub(super) fn admin() -> UserId {
    UserId::new("admin-1")
}

pub(super) fn submission(business: &BusinessId, criterion: &str, nilai: i64) -> ScoreSubmission {
    ScoreSubmission {
        business_id: business.clone(),
        criterion_id: CriterionId(criterion.to_string()),
        nilai,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

type RivalWrite = Box<dyn FnOnce(&Arc<MemoryStore>) + Send>;

/// Judging store wrapper that lets a rival write land right before the next category or
/// score commit, after the service under test has done its reads.
pub(super) struct InterleavingJudging {
    inner: Arc<MemoryStore>,
    rival: Mutex<Option<RivalWrite>>,
}

impl InterleavingJudging {
    pub(super) fn before_next_commit(
        &self,
        write: impl FnOnce(&Arc<MemoryStore>) + Send + 'static,
    ) {
        *self.rival.lock().expect("rival mutex poisoned") = Some(Box::new(write));
    }

    fn run_rival(&self) {
        let rival = self.rival.lock().expect("rival mutex poisoned").take();
        if let Some(write) = rival {
            write(&self.inner);
        }
    }
}

impl JudgingRepository for InterleavingJudging {
    fn commit_category<E, F>(
        &self,
        category: AssessmentCategory,
        expected: Option<u64>,
        check: F,
    ) -> Result<AssessmentCategory, E>
    where
        F: FnOnce(&Event) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.run_rival();
        self.inner.commit_category(category, expected, check)
    }

    fn fetch_category(
        &self,
        id: &CategoryId,
    ) -> Result<Option<AssessmentCategory>, RepositoryError> {
        self.inner.fetch_category(id)
    }

    fn categories_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<AssessmentCategory>, RepositoryError> {
        self.inner.categories_for_event(event_id)
    }

    fn upsert_score<E, F>(&self, key: &ScoreKey, build: F) -> Result<(Score, Option<Score>), E>
    where
        F: FnOnce(ScoreScope<'_>) -> Result<Score, E>,
        E: From<RepositoryError>,
    {
        self.run_rival();
        self.inner.upsert_score(key, build)
    }

    fn scores_for_category(&self, category_id: &CategoryId) -> Result<Vec<Score>, RepositoryError> {
        self.inner.scores_for_category(category_id)
    }
}

pub(super) struct InterleavedFixture {
    pub(super) base: Fixture,
    pub(super) judging: JudgingService<InterleavingJudging, MemoryStore, MemoryNotifications>,
    pub(super) repository: Arc<InterleavingJudging>,
    pub(super) store: Arc<MemoryStore>,
}

pub(super) fn interleaved_fixture() -> InterleavedFixture {
    let store = Arc::new(MemoryStore::new());
    let base = fixture_on(store.clone());
    let repository = Arc::new(InterleavingJudging {
        inner: store.clone(),
        rival: Mutex::new(None),
    });
    let judging = JudgingService::new(
        repository.clone(),
        store.clone(),
        Arc::new(MemoryNotifications::default()),
    );
    InterleavedFixture {
        base,
        judging,
        repository,
        store,
    }
}

/// Locks `event_id` through a separate service, standing in for a concurrent admin request.
pub(super) fn rival_lock(store: &Arc<MemoryStore>, event_id: &EventId) {
    ParticipationService::new(
        store.clone(),
        Arc::new(MemoryNotifications::default()),
        WorkflowConfig::default(),
    )
    .set_event_lock(event_id, true)
    .expect("rival locks the event");
}
