use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AssessmentCategory, WinnerSelection};
use super::ranking::RankingEntry;
use crate::workflows::actors::UserId;
use crate::workflows::participation::domain::BusinessId;

/// Applies an admin's winner choice to a category. Rank #1 is only a suggestion; any
/// business with at least one recorded score may be picked.
#[derive(Debug, Default, Clone, Copy)]
pub struct WinnerSelector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum WinnerChange {
    Selected,
    Replaced { previous: BusinessId },
    Unchanged,
}

impl WinnerChange {
    pub fn is_noop(&self) -> bool {
        matches!(self, WinnerChange::Unchanged)
    }
}

/// The requested business has no recorded score in the category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotRanked(pub BusinessId);

impl WinnerSelector {
    pub fn select(
        &self,
        category: &mut AssessmentCategory,
        ranking: &[RankingEntry],
        business_id: &BusinessId,
        selected_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<WinnerChange, NotRanked> {
        let ranked = ranking
            .iter()
            .any(|entry| &entry.business_id == business_id && entry.is_scored());
        if !ranked {
            return Err(NotRanked(business_id.clone()));
        }

        let change = match category.winner_id() {
            Some(current) if current == business_id => return Ok(WinnerChange::Unchanged),
            Some(previous) => WinnerChange::Replaced {
                previous: previous.clone(),
            },
            None => WinnerChange::Selected,
        };

        category.winner = Some(WinnerSelection {
            business_id: business_id.clone(),
            selected_by: selected_by.clone(),
            selected_at: now,
        });
        Ok(change)
    }

    /// Clear the winner, returning the selection that was removed.
    pub fn revoke(&self, category: &mut AssessmentCategory) -> Option<WinnerSelection> {
        category.winner.take()
    }
}

/// Suggested winner: the top entry, when it has any score.
pub fn suggestion(ranking: &[RankingEntry]) -> Option<&RankingEntry> {
    ranking.first().filter(|entry| entry.is_scored())
}
