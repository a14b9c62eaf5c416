use super::domain::{AssessmentCategory, CategoryId, Score, ScoreKey};
use crate::workflows::errors::RepositoryError;
use crate::workflows::participation::domain::{Business, Event, EventId};

/// Storage for assessment categories and their score rows.
///
/// Implementations share the event and business tables of the participation store: every
/// write re-reads the rows it depends on in the same critical section as the write itself,
/// so a lock or status change landing after the service's reads is still honoured.
pub trait JudgingRepository: Send + Sync {
    /// Insert `category` (`expected_version == None`) or compare-and-swap it against the
    /// stored version, once `check` accepts the category's event as stored at commit time.
    fn commit_category<E, F>(
        &self,
        category: AssessmentCategory,
        expected_version: Option<u64>,
        check: F,
    ) -> Result<AssessmentCategory, E>
    where
        F: FnOnce(&Event) -> Result<(), E>,
        E: From<RepositoryError>;
    fn fetch_category(&self, id: &CategoryId)
        -> Result<Option<AssessmentCategory>, RepositoryError>;
    fn categories_for_event(
        &self,
        event_id: &EventId,
    ) -> Result<Vec<AssessmentCategory>, RepositoryError>;

    /// Store the row `build` produces from the scope of `key`. The last write for a triple
    /// wins; the replaced row, if any, is returned alongside the stored one.
    fn upsert_score<E, F>(&self, key: &ScoreKey, build: F) -> Result<(Score, Option<Score>), E>
    where
        F: FnOnce(ScoreScope<'_>) -> Result<Score, E>,
        E: From<RepositoryError>;
    fn scores_for_category(&self, category_id: &CategoryId) -> Result<Vec<Score>, RepositoryError>;
}

/// Rows a score write is admitted against.
#[derive(Debug, Clone, Copy)]
pub struct ScoreScope<'a> {
    pub event: &'a Event,
    pub category: &'a AssessmentCategory,
    pub business: Option<&'a Business>,
}
