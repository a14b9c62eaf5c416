//! Assessment categories, weighted scoring and winner selection.
//!
//! Scores are accepted only for admin-approved businesses of a running, unlocked event, and
//! only once the category's criteria weights sum to exactly 100. Rankings are recomputed from
//! the stored score rows on every read.

pub mod criteria;
pub mod domain;
pub mod import;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;
pub mod winner;

#[cfg(test)]
mod tests;

pub use criteria::{CriteriaError, CriteriaReport, CriteriaValidator, TOTAL_WEIGHT};
pub use domain::{
    AssessmentCategory, CategoryDraft, CategoryId, Criterion, CriterionDraft, CriterionId, Score,
    ScoreKey, ScoreSubmission, WinnerSelection,
};
pub use import::{ScoreImportError, ScoreSheetImporter};
pub use ranking::{RankingEntry, ScoreAggregator, WeightedScore};
pub use repository::{JudgingRepository, ScoreScope};
pub use router::judging_router;
pub use service::{
    CategoryRanking, JudgingError, JudgingService, RejectedScore, ScoreBatchOutcome,
    WinnerOutcome,
};
pub use winner::{WinnerChange, WinnerSelector};
