//! In-process storage and notification sinks used by the API binary, the demo and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::errors::RepositoryError;
use super::judging::domain::{AssessmentCategory, CategoryId, Score, ScoreKey};
use super::judging::repository::{JudgingRepository, ScoreScope};
use super::mentoring::domain::{StageStatus, Umkm, UmkmId};
use super::mentoring::repository::MentoringRepository;
use super::notifications::{Notification, NotificationError, NotificationPublisher};
use super::participation::domain::{Business, BusinessId, Event, EventId};
use super::participation::repository::ParticipationRepository;

#[derive(Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    businesses: HashMap<BusinessId, Business>,
    categories: HashMap<CategoryId, AssessmentCategory>,
    scores: HashMap<ScoreKey, Score>,
    umkm: HashMap<UmkmId, Umkm>,
}

/// Mutex-guarded tables implementing every workflow repository.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        f(&mut guard)
    }
}

fn insert_new<K, V>(
    table: &mut HashMap<K, V>,
    key: K,
    value: V,
) -> Result<V, RepositoryError>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    if table.contains_key(&key) {
        return Err(RepositoryError::Conflict);
    }
    table.insert(key, value.clone());
    Ok(value)
}

/// Store `value` only when the stored version equals `expected`; the stored copy gets
/// `expected + 1`.
fn compare_and_swap<K, V>(
    table: &mut HashMap<K, V>,
    entity: &'static str,
    key: K,
    mut value: V,
    expected: u64,
    version: impl Fn(&mut V) -> &mut u64,
) -> Result<V, RepositoryError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
    V: Clone,
{
    let stored = table
        .get_mut(&key)
        .ok_or_else(|| RepositoryError::not_found(entity, key.to_string()))?;
    if *version(stored) != expected {
        return Err(RepositoryError::stale(entity, key.to_string()));
    }
    *version(&mut value) = expected + 1;
    *stored = value.clone();
    Ok(value)
}

impl ParticipationRepository for MemoryStore {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError> {
        self.with_tables(|tables| insert_new(&mut tables.events, event.id.clone(), event))
    }

    fn update_event(&self, event: Event, expected_version: u64) -> Result<Event, RepositoryError> {
        self.with_tables(|tables| {
            compare_and_swap(
                &mut tables.events,
                "event",
                event.id.clone(),
                event,
                expected_version,
                |event| &mut event.version,
            )
        })
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.events.get(id).cloned()))
    }

    fn commit_business<E, F>(
        &self,
        business: Business,
        expected_version: Option<u64>,
        check: F,
    ) -> Result<Business, E>
    where
        F: FnOnce(&Event, &[&Business]) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.with_tables(|tables| -> Result<Business, E> {
            let event = tables.events.get(&business.event_id).ok_or_else(|| {
                RepositoryError::not_found("event", business.event_id.0.clone())
            })?;
            let siblings: Vec<&Business> = tables
                .businesses
                .values()
                .filter(|other| other.event_id == business.event_id)
                .collect();
            check(event, &siblings)?;

            let key = business.id.clone();
            let stored = match expected_version {
                None => insert_new(&mut tables.businesses, key, business),
                Some(expected) => compare_and_swap(
                    &mut tables.businesses,
                    "business",
                    key,
                    business,
                    expected,
                    |business| &mut business.version,
                ),
            };
            stored.map_err(E::from)
        })
    }

    fn fetch_business(&self, id: &BusinessId) -> Result<Option<Business>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.businesses.get(id).cloned()))
    }

    fn businesses_for_event(&self, event_id: &EventId) -> Result<Vec<Business>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .businesses
                .values()
                .filter(|business| &business.event_id == event_id)
                .cloned()
                .collect()
        }))
    }
}

impl JudgingRepository for MemoryStore {
    fn commit_category<E, F>(
        &self,
        category: AssessmentCategory,
        expected_version: Option<u64>,
        check: F,
    ) -> Result<AssessmentCategory, E>
    where
        F: FnOnce(&Event) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        self.with_tables(|tables| -> Result<AssessmentCategory, E> {
            let event = tables.events.get(&category.event_id).ok_or_else(|| {
                RepositoryError::not_found("event", category.event_id.0.clone())
            })?;
            check(event)?;

            let key = category.id.clone();
            let stored = match expected_version {
                None => insert_new(&mut tables.categories, key, category),
                Some(expected) => compare_and_swap(
                    &mut tables.categories,
                    "category",
                    key,
                    category,
                    expected,
                    |category| &mut category.version,
                ),
            };
            stored.map_err(E::from)
        })
    }

    fn fetch_category(
        &self,
        id: &CategoryId,
    ) -> Result<Option<AssessmentCategory>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.categories.get(id).cloned()))
    }

    fn categories_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<AssessmentCategory>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .categories
                .values()
                .filter(|category| &category.event_id == event_id)
                .cloned()
                .collect()
        }))
    }

    fn upsert_score<E, F>(&self, key: &ScoreKey, build: F) -> Result<(Score, Option<Score>), E>
    where
        F: FnOnce(ScoreScope<'_>) -> Result<Score, E>,
        E: From<RepositoryError>,
    {
        self.with_tables(|tables| -> Result<(Score, Option<Score>), E> {
            let category = tables.categories.get(&key.category_id).ok_or_else(|| {
                RepositoryError::not_found("category", key.category_id.0.clone())
            })?;
            let event = tables.events.get(&category.event_id).ok_or_else(|| {
                RepositoryError::not_found("event", category.event_id.0.clone())
            })?;
            let score = build(ScoreScope {
                event,
                category,
                business: tables.businesses.get(&key.business_id),
            })?;

            let replaced = tables.scores.insert(score.key.clone(), score.clone());
            Ok((score, replaced))
        })
    }

    fn scores_for_category(&self, category_id: &CategoryId) -> Result<Vec<Score>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .scores
                .values()
                .filter(|score| &score.key.category_id == category_id)
                .cloned()
                .collect()
        }))
    }
}

impl MentoringRepository for MemoryStore {
    fn insert_umkm(&self, umkm: Umkm) -> Result<Umkm, RepositoryError> {
        self.with_tables(|tables| insert_new(&mut tables.umkm, umkm.id.clone(), umkm))
    }

    fn update_umkm(&self, umkm: Umkm, expected_version: u64) -> Result<Umkm, RepositoryError> {
        self.with_tables(|tables| {
            compare_and_swap(
                &mut tables.umkm,
                "umkm",
                umkm.id.clone(),
                umkm,
                expected_version,
                |umkm| &mut umkm.version,
            )
        })
    }

    fn fetch_umkm(&self, id: &UmkmId) -> Result<Option<Umkm>, RepositoryError> {
        Ok(self.with_tables(|tables| tables.umkm.get(id).cloned()))
    }

    fn awaiting_validation(&self) -> Result<Vec<Umkm>, RepositoryError> {
        Ok(self.with_tables(|tables| {
            tables
                .umkm
                .values()
                .filter(|umkm| {
                    umkm.stages
                        .iter()
                        .any(|stage| stage.status == StageStatus::MenungguValidasi)
                })
                .cloned()
                .collect()
        }))
    }
}

/// Publisher that keeps every notification in memory.
#[derive(Default, Clone)]
pub struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub fn templates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|notification| notification.template)
            .collect()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}
