use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::criteria::{CriteriaError, CriteriaReport, CriteriaValidator};
use super::domain::{
    AssessmentCategory, CategoryDraft, CategoryId, CriterionDraft, CriterionId, Score, ScoreKey,
    ScoreSubmission,
};
use super::ranking::{RankingEntry, ScoreAggregator};
use super::repository::{JudgingRepository, ScoreScope};
use super::winner::{self, NotRanked, WinnerChange, WinnerSelector};
use crate::workflows::actors::UserId;
use crate::workflows::errors::{RepositoryError, WorkflowErrorKind};
use crate::workflows::notifications::{dispatch, Notification, NotificationPublisher};
use crate::workflows::participation::domain::{BusinessId, BusinessView, Event, EventId};
use crate::workflows::participation::repository::ParticipationRepository;

/// Category catalog, scoring and winner selection over the participation store.
pub struct JudgingService<J, P, N> {
    judging: Arc<J>,
    participation: Arc<P>,
    notifications: Arc<N>,
    validator: CriteriaValidator,
    aggregator: ScoreAggregator,
    selector: WinnerSelector,
}

static CATEGORY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_category_id() -> CategoryId {
    let id = CATEGORY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CategoryId(format!("kategori-{id:06}"))
}

/// Leaderboard of a category plus what the award view needs alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRanking {
    pub category_id: CategoryId,
    pub event_id: EventId,
    pub criteria: CriteriaReport,
    pub winner: Option<BusinessId>,
    pub suggested_winner: Option<BusinessId>,
    pub entries: Vec<RankingEntry>,
}

/// Per-entry outcome of a best-effort scoring batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBatchOutcome {
    pub accepted: usize,
    pub rejected: Vec<RejectedScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedScore {
    pub index: usize,
    pub business_id: BusinessId,
    pub criterion_id: CriterionId,
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerOutcome {
    pub category: AssessmentCategory,
    pub change: WinnerChange,
}

impl<J, P, N> JudgingService<J, P, N>
where
    J: JudgingRepository + 'static,
    P: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(judging: Arc<J>, participation: Arc<P>, notifications: Arc<N>) -> Self {
        Self {
            judging,
            participation,
            notifications,
            validator: CriteriaValidator,
            aggregator: ScoreAggregator,
            selector: WinnerSelector,
        }
    }

    pub fn create_category(
        &self,
        event_id: &EventId,
        draft: CategoryDraft,
    ) -> Result<AssessmentCategory, JudgingError> {
        let event = self.load_event(event_id)?;
        ensure_event_unlocked(&event)?;

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(JudgingError::Invalid(
                "category name must not be empty".to_string(),
            ));
        }
        let criteria = self.validator.prepare(draft.criteria)?;

        let category = AssessmentCategory {
            id: next_category_id(),
            event_id: event.id,
            name,
            criteria,
            evaluators: draft.evaluators.into_iter().collect(),
            winner: None,
            version: 0,
        };
        let stored = self.judging.commit_category(category, None, ensure_event_unlocked)?;
        info!(category_id = %stored.id, event_id = %stored.event_id, "assessment category created");
        Ok(stored)
    }

    pub fn category(&self, category_id: &CategoryId) -> Result<AssessmentCategory, JudgingError> {
        Ok(self.load_category(category_id)?)
    }

    pub fn categories(&self, event_id: &EventId) -> Result<Vec<AssessmentCategory>, JudgingError> {
        let event = self.load_event(event_id)?;
        let mut categories = self.judging.categories_for_event(&event.id)?;
        categories.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(categories)
    }

    /// Replace the category's criteria. Unbalanced weights are saved as a draft; the
    /// validator blocks scoring until they sum to 100.
    pub fn replace_criteria(
        &self,
        category_id: &CategoryId,
        drafts: Vec<CriterionDraft>,
    ) -> Result<AssessmentCategory, JudgingError> {
        let mut category = self.load_category(category_id)?;
        self.ensure_unlocked(&category)?;

        let expected = category.version;
        category.criteria = self.validator.prepare(drafts)?;
        let stored = self.commit_unlocked(category, expected)?;
        info!(
            category_id = %stored.id,
            criteria = stored.criteria.len(),
            valid = self.validator.validate(&stored.criteria).is_ok(),
            "category criteria replaced"
        );
        Ok(stored)
    }

    pub fn assign_evaluators(
        &self,
        category_id: &CategoryId,
        evaluators: Vec<UserId>,
    ) -> Result<AssessmentCategory, JudgingError> {
        let mut category = self.load_category(category_id)?;
        self.ensure_unlocked(&category)?;

        let expected = category.version;
        category.evaluators = evaluators.into_iter().collect::<BTreeSet<_>>();
        let stored = self.commit_unlocked(category, expected)?;
        info!(
            category_id = %stored.id,
            evaluators = stored.evaluators.len(),
            "evaluators assigned"
        );
        Ok(stored)
    }

    pub fn validate_criteria(
        &self,
        category_id: &CategoryId,
    ) -> Result<CriteriaReport, JudgingError> {
        let category = self.load_category(category_id)?;
        Ok(self.validator.report(&category.criteria))
    }

    /// Record one nilai. Resubmitting the same triple overwrites the earlier value.
    pub fn submit_score(
        &self,
        category_id: &CategoryId,
        evaluator_id: &UserId,
        submission: ScoreSubmission,
    ) -> Result<Score, JudgingError> {
        let category = self.load_category(category_id)?;
        self.record_score(&category.id, evaluator_id, &submission)
    }

    /// Apply every entry independently; one rejected entry never blocks the others.
    pub fn submit_scores(
        &self,
        category_id: &CategoryId,
        evaluator_id: &UserId,
        submissions: Vec<ScoreSubmission>,
    ) -> Result<ScoreBatchOutcome, JudgingError> {
        let category = self.load_category(category_id)?;
        let mut outcome = ScoreBatchOutcome {
            accepted: 0,
            rejected: Vec::new(),
        };

        for (index, submission) in submissions.into_iter().enumerate() {
            let business_id = submission.business_id.clone();
            let criterion_id = submission.criterion_id.clone();
            match self.record_score(&category.id, evaluator_id, &submission) {
                Ok(_) => outcome.accepted += 1,
                Err(error) => {
                    debug!(
                        category_id = %category.id,
                        business_id = %business_id,
                        criterion_id = %criterion_id,
                        %error,
                        "score entry rejected"
                    );
                    outcome.rejected.push(RejectedScore {
                        index,
                        business_id,
                        criterion_id,
                        code: error.code(),
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(
            category_id = %category.id,
            accepted = outcome.accepted,
            rejected = outcome.rejected.len(),
            "score batch processed"
        );
        Ok(outcome)
    }

    /// Recomputed from current score rows on every call.
    pub fn ranking(&self, category_id: &CategoryId) -> Result<CategoryRanking, JudgingError> {
        let category = self.load_category(category_id)?;
        let entries = self.rank(&category)?;

        Ok(CategoryRanking {
            category_id: category.id.clone(),
            event_id: category.event_id.clone(),
            criteria: self.validator.report(&category.criteria),
            winner: category.winner_id().cloned(),
            suggested_winner: winner::suggestion(&entries).map(|entry| entry.business_id.clone()),
            entries,
        })
    }

    pub fn set_winner(
        &self,
        category_id: &CategoryId,
        business_id: &BusinessId,
        selected_by: &UserId,
    ) -> Result<WinnerOutcome, JudgingError> {
        let mut category = self.load_category(category_id)?;
        let event = self.load_event(&category.event_id)?;
        ensure_winner_selectable(&category.id, &event)?;
        self.validator.validate(&category.criteria)?;

        let ranking = self.rank(&category)?;
        let expected = category.version;
        let change = self
            .selector
            .select(&mut category, &ranking, business_id, selected_by, Utc::now())
            .map_err(|NotRanked(business_id)| JudgingError::NotRanked {
                category_id: category_id.clone(),
                business_id,
            })?;

        if change.is_noop() {
            return Ok(WinnerOutcome { category, change });
        }

        let id = category.id.clone();
        let stored = self.judging.commit_category(category, Some(expected), |event| {
            ensure_winner_selectable(&id, event)
        })?;
        info!(category_id = %stored.id, business_id = %business_id, ?change, "category winner set");

        if let Some(business) = self.participation.fetch_business(business_id)? {
            dispatch(
                self.notifications.as_ref(),
                Notification::new(
                    "category_winner_selected",
                    business.owner_id().0.clone(),
                    business.id.0.clone(),
                )
                .with_detail("category", stored.name.clone()),
            );
        }

        Ok(WinnerOutcome {
            category: stored,
            change,
        })
    }

    /// Clear the winner. Revoking a category without a winner is a no-op.
    pub fn revoke_winner(
        &self,
        category_id: &CategoryId,
    ) -> Result<AssessmentCategory, JudgingError> {
        let mut category = self.load_category(category_id)?;
        self.ensure_unlocked(&category)?;

        let expected = category.version;
        let Some(revoked) = self.selector.revoke(&mut category) else {
            return Ok(category);
        };
        let stored = self.commit_unlocked(category, expected)?;
        info!(
            category_id = %stored.id,
            business_id = %revoked.business_id,
            "category winner revoked"
        );
        Ok(stored)
    }

    fn record_score(
        &self,
        category_id: &CategoryId,
        evaluator_id: &UserId,
        submission: &ScoreSubmission,
    ) -> Result<Score, JudgingError> {
        let key = ScoreKey {
            business_id: submission.business_id.clone(),
            category_id: category_id.clone(),
            criterion_id: submission.criterion_id.clone(),
        };
        let (score, replaced) = self.judging.upsert_score(&key, |scope| {
            self.admit_score(scope, &key, evaluator_id, submission)
        })?;
        debug!(
            category_id = %score.key.category_id,
            business_id = %score.key.business_id,
            criterion_id = %score.key.criterion_id,
            nilai = score.nilai,
            previous = ?replaced.map(|row| row.nilai),
            "score recorded"
        );
        Ok(score)
    }

    /// Admission order: lock, event status, criteria, evaluator, range, business.
    fn admit_score(
        &self,
        scope: ScoreScope<'_>,
        key: &ScoreKey,
        evaluator_id: &UserId,
        submission: &ScoreSubmission,
    ) -> Result<Score, JudgingError> {
        let ScoreScope {
            event,
            category,
            business,
        } = scope;
        ensure_category_unlocked(&category.id, event)?;
        if !event.status.accepts_scores() {
            return Err(JudgingError::EventStatus {
                event: Box::new(event.clone()),
                action: "score",
            });
        }
        self.validator.validate(&category.criteria)?;

        if category.criterion(&submission.criterion_id).is_none() {
            return Err(JudgingError::UnknownCriterion {
                category_id: category.id.clone(),
                criterion_id: submission.criterion_id.clone(),
            });
        }
        if !category.evaluators.contains(evaluator_id) {
            return Err(JudgingError::NotEvaluator {
                category_id: category.id.clone(),
                user_id: evaluator_id.clone(),
            });
        }
        let nilai = u8::try_from(submission.nilai)
            .ok()
            .filter(|nilai| *nilai <= 100)
            .ok_or(JudgingError::OutOfRange {
                nilai: submission.nilai,
            })?;

        let business = business
            .ok_or_else(|| RepositoryError::not_found("business", key.business_id.0.clone()))?;
        if business.event_id != category.event_id {
            return Err(JudgingError::BusinessNotInEvent {
                business_id: business.id.clone(),
                event_id: category.event_id.clone(),
            });
        }
        if !business.is_participating() {
            return Err(JudgingError::NotParticipating(Box::new(business.view())));
        }

        Ok(Score {
            key: key.clone(),
            nilai,
            evaluator_id: evaluator_id.clone(),
            recorded_at: Utc::now(),
        })
    }

    fn rank(&self, category: &AssessmentCategory) -> Result<Vec<RankingEntry>, JudgingError> {
        let businesses = self.participation.businesses_for_event(&category.event_id)?;
        let scores = self.judging.scores_for_category(&category.id)?;
        Ok(self.aggregator.rank(category, &businesses, &scores))
    }

    /// Fast-path refusal before any work; the commit repeats the check.
    fn ensure_unlocked(&self, category: &AssessmentCategory) -> Result<(), JudgingError> {
        let event = self.load_event(&category.event_id)?;
        ensure_category_unlocked(&category.id, &event)
    }

    fn commit_unlocked(
        &self,
        category: AssessmentCategory,
        expected: u64,
    ) -> Result<AssessmentCategory, JudgingError> {
        let id = category.id.clone();
        self.judging.commit_category(category, Some(expected), |event| {
            ensure_category_unlocked(&id, event)
        })
    }

    fn load_category(
        &self,
        category_id: &CategoryId,
    ) -> Result<AssessmentCategory, RepositoryError> {
        self.judging
            .fetch_category(category_id)?
            .ok_or_else(|| RepositoryError::not_found("category", category_id.0.clone()))
    }

    fn load_event(&self, event_id: &EventId) -> Result<Event, RepositoryError> {
        self.participation
            .fetch_event(event_id)?
            .ok_or_else(|| RepositoryError::not_found("event", event_id.0.clone()))
    }
}

fn ensure_event_unlocked(event: &Event) -> Result<(), JudgingError> {
    if event.locked {
        return Err(JudgingError::EventLocked(event.id.clone()));
    }
    Ok(())
}

fn ensure_category_unlocked(category_id: &CategoryId, event: &Event) -> Result<(), JudgingError> {
    if event.locked {
        return Err(JudgingError::CategoryLocked {
            category_id: category_id.clone(),
            event_id: event.id.clone(),
        });
    }
    Ok(())
}

fn ensure_winner_selectable(category_id: &CategoryId, event: &Event) -> Result<(), JudgingError> {
    ensure_category_unlocked(category_id, event)?;
    if !event.status.accepts_winner_selection() {
        return Err(JudgingError::EventStatus {
            event: Box::new(event.clone()),
            action: "select a winner for",
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum JudgingError {
    #[error("category {category_id} belongs to locked event {event_id}")]
    CategoryLocked {
        category_id: CategoryId,
        event_id: EventId,
    },
    #[error("event {0} is locked")]
    EventLocked(EventId),
    #[error("event {} is {}; cannot {action} it", event.id, event.status)]
    EventStatus {
        event: Box<Event>,
        action: &'static str,
    },
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error("nilai {nilai} is outside 0..=100")]
    OutOfRange { nilai: i64 },
    #[error("criterion {criterion_id} is not part of category {category_id}")]
    UnknownCriterion {
        category_id: CategoryId,
        criterion_id: CriterionId,
    },
    #[error("{user_id} is not an evaluator of category {category_id}")]
    NotEvaluator {
        category_id: CategoryId,
        user_id: UserId,
    },
    #[error("business {business_id} is not registered for event {event_id}")]
    BusinessNotInEvent {
        business_id: BusinessId,
        event_id: EventId,
    },
    #[error("business {} is not an approved participant", .0.business_id)]
    NotParticipating(Box<BusinessView>),
    #[error("business {business_id} has no recorded score in category {category_id}")]
    NotRanked {
        category_id: CategoryId,
        business_id: BusinessId,
    },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl JudgingError {
    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            JudgingError::CategoryLocked { .. } | JudgingError::EventLocked(_) => {
                WorkflowErrorKind::Locked
            }
            JudgingError::EventStatus { .. } | JudgingError::NotParticipating(_) => {
                WorkflowErrorKind::InvalidTransition
            }
            JudgingError::Criteria(_)
            | JudgingError::OutOfRange { .. }
            | JudgingError::UnknownCriterion { .. }
            | JudgingError::BusinessNotInEvent { .. }
            | JudgingError::NotRanked { .. }
            | JudgingError::Invalid(_) => WorkflowErrorKind::Validation,
            JudgingError::NotEvaluator { .. } => WorkflowErrorKind::Forbidden,
            JudgingError::Repository(error) => error.kind(),
        }
    }

    /// Stable machine-readable code reported for rejected batch entries.
    pub fn code(&self) -> &'static str {
        match self {
            JudgingError::CategoryLocked { .. } => "CATEGORY_LOCKED",
            JudgingError::EventLocked(_) => "LOCKED",
            JudgingError::EventStatus { .. } | JudgingError::NotParticipating(_) => {
                "INVALID_TRANSITION"
            }
            JudgingError::Criteria(error) => error.code(),
            JudgingError::OutOfRange { .. } => "OUT_OF_RANGE",
            JudgingError::UnknownCriterion { .. } => "UNKNOWN_CRITERION",
            JudgingError::NotEvaluator { .. } => "FORBIDDEN",
            JudgingError::BusinessNotInEvent { .. } => "BUSINESS_NOT_IN_EVENT",
            JudgingError::NotRanked { .. } => "NOT_RANKED",
            JudgingError::Invalid(_) => "VALIDATION",
            JudgingError::Repository(error) => error.kind().label(),
        }
    }

    /// State the client should resync to on `INVALID_TRANSITION`.
    pub fn current_state(&self) -> Option<Value> {
        match self {
            JudgingError::EventStatus { event, .. } => serde_json::to_value(event.as_ref()).ok(),
            JudgingError::NotParticipating(current) => serde_json::to_value(current.as_ref()).ok(),
            _ => None,
        }
    }
}
