use super::domain::{Business, BusinessId, Event, EventId};
use crate::workflows::errors::RepositoryError;

/// Storage abstraction for events and their registered businesses.
///
/// `update_event` is a compare-and-swap write: the record is stored only when the stored
/// version still equals `expected_version`, and the stored copy receives the next version.
/// A mismatch yields [`RepositoryError::StaleRecord`].
pub trait ParticipationRepository: Send + Sync {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError>;
    fn update_event(&self, event: Event, expected_version: u64) -> Result<Event, RepositoryError>;
    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError>;

    /// Insert `business` (`expected_version == None`) or compare-and-swap it against the
    /// stored version.
    ///
    /// `check` sees the owning event and every business of that event as stored at commit
    /// time, and runs in the same critical section as the write. Nothing is written when it
    /// fails.
    fn commit_business<E, F>(
        &self,
        business: Business,
        expected_version: Option<u64>,
        check: F,
    ) -> Result<Business, E>
    where
        F: FnOnce(&Event, &[&Business]) -> Result<(), E>,
        E: From<RepositoryError>;
    fn fetch_business(&self, id: &BusinessId) -> Result<Option<Business>, RepositoryError>;
    fn businesses_for_event(&self, event_id: &EventId) -> Result<Vec<Business>, RepositoryError>;
}
