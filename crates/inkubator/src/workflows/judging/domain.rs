use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::actors::UserId;
use crate::workflows::participation::domain::{BusinessId, EventId};

/// Identifier wrapper for assessment categories (kategori penilaian).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub String);

/// Identifier of a criterion, unique within its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Weighted sub-metric (kriteria). `weight` is an integer percent (bobot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub weight: u8,
}

/// Admin-selected category winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerSelection {
    pub business_id: BusinessId,
    pub selected_by: UserId,
    pub selected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentCategory {
    pub id: CategoryId,
    pub event_id: EventId,
    pub name: String,
    pub criteria: Vec<Criterion>,
    pub evaluators: BTreeSet<UserId>,
    pub winner: Option<WinnerSelection>,
    pub version: u64,
}

impl AssessmentCategory {
    pub fn criterion(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    pub fn winner_id(&self) -> Option<&BusinessId> {
        self.winner.as_ref().map(|winner| &winner.business_id)
    }
}

/// Criterion as submitted by the admin, before range checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDraft {
    #[serde(default)]
    pub id: Option<CriterionId>,
    pub name: String,
    pub weight: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<CriterionDraft>,
    #[serde(default)]
    pub evaluators: Vec<UserId>,
}

/// Uniqueness key of a score row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScoreKey {
    pub business_id: BusinessId,
    pub category_id: CategoryId,
    pub criterion_id: CriterionId,
}

/// Recorded nilai for one (business, category, criterion) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub key: ScoreKey,
    pub nilai: u8,
    pub evaluator_id: UserId,
    pub recorded_at: DateTime<Utc>,
}

/// One entry of a scoring form. `nilai` is range-checked by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub business_id: BusinessId,
    pub criterion_id: CriterionId,
    pub nilai: i64,
}
