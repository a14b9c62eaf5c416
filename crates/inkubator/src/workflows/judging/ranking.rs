use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use super::domain::{AssessmentCategory, CriterionId, Score};
use crate::workflows::participation::domain::{Business, BusinessId};

/// Computes weighted totals and the leaderboard of a category. Always derived from the
/// score rows passed in; nothing is cached.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreAggregator;

/// Weighted contribution of one criterion. `nilai` is `None` until a score is recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedScore {
    pub criterion_id: CriterionId,
    pub name: String,
    pub weight: u8,
    pub nilai: Option<u8>,
    pub weighted: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub business_id: BusinessId,
    pub business_name: String,
    pub total_score: f64,
    pub scored_criteria: usize,
    pub complete: bool,
    pub per_criterion: Vec<WeightedScore>,
}

impl RankingEntry {
    pub fn is_scored(&self) -> bool {
        self.scored_criteria > 0
    }
}

struct Tally<'a> {
    business: &'a Business,
    // nilai * weight summed over scored criteria, i.e. total score in hundredths
    hundredths: u32,
    scored: usize,
    per_criterion: Vec<WeightedScore>,
}

impl ScoreAggregator {
    /// Rank the admin-approved, active businesses of the category's event.
    ///
    /// Order: businesses with at least one score first, then total descending, then earlier
    /// registration, then business id.
    pub fn rank(
        &self,
        category: &AssessmentCategory,
        businesses: &[Business],
        scores: &[Score],
    ) -> Vec<RankingEntry> {
        let mut by_business: HashMap<&BusinessId, HashMap<&CriterionId, u8>> = HashMap::new();
        for score in scores
            .iter()
            .filter(|score| score.key.category_id == category.id)
        {
            by_business
                .entry(&score.key.business_id)
                .or_default()
                .insert(&score.key.criterion_id, score.nilai);
        }

        let mut tallies: Vec<Tally<'_>> = businesses
            .iter()
            .filter(|business| business.event_id == category.event_id)
            .filter(|business| business.is_participating())
            .map(|business| {
                let recorded = by_business.get(&business.id);
                let mut tally = Tally {
                    business,
                    hundredths: 0,
                    scored: 0,
                    per_criterion: Vec::with_capacity(category.criteria.len()),
                };

                for criterion in &category.criteria {
                    let nilai = recorded.and_then(|row| row.get(&criterion.id)).copied();
                    if let Some(nilai) = nilai {
                        tally.hundredths += u32::from(nilai) * u32::from(criterion.weight);
                        tally.scored += 1;
                    }
                    tally.per_criterion.push(WeightedScore {
                        criterion_id: criterion.id.clone(),
                        name: criterion.name.clone(),
                        weight: criterion.weight,
                        nilai,
                        weighted: nilai.map(|nilai| weighted(nilai, criterion.weight)),
                    });
                }
                tally
            })
            .collect();

        tallies.sort_by(compare_tallies);

        let criteria_count = category.criteria.len();
        tallies
            .into_iter()
            .enumerate()
            .map(|(index, tally)| RankingEntry {
                rank: index + 1,
                business_id: tally.business.id.clone(),
                business_name: tally.business.name.clone(),
                total_score: f64::from(tally.hundredths) / 100.0,
                scored_criteria: tally.scored,
                complete: criteria_count > 0 && tally.scored == criteria_count,
                per_criterion: tally.per_criterion,
            })
            .collect()
    }
}

/// `nilai * weight / 100`.
pub fn weighted(nilai: u8, weight: u8) -> f64 {
    f64::from(u32::from(nilai) * u32::from(weight)) / 100.0
}

fn compare_tallies(a: &Tally<'_>, b: &Tally<'_>) -> Ordering {
    (a.scored == 0)
        .cmp(&(b.scored == 0))
        .then_with(|| b.hundredths.cmp(&a.hundredths))
        .then_with(|| a.business.registered_at.cmp(&b.business.registered_at))
        .then_with(|| a.business.id.cmp(&b.business.id))
}
