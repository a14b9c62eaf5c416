use std::collections::HashSet;

use serde::Serialize;

use super::domain::{Criterion, CriterionDraft, CriterionId};

/// Required sum of all criterion weights in a category.
pub const TOTAL_WEIGHT: u32 = 100;

/// Checks category criteria weights. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct CriteriaValidator;

impl CriteriaValidator {
    /// Weights must sum to exactly [`TOTAL_WEIGHT`]; no tolerance either way.
    pub fn validate(&self, criteria: &[Criterion]) -> Result<(), CriteriaError> {
        let actual_sum: u32 = criteria.iter().map(|criterion| u32::from(criterion.weight)).sum();
        if actual_sum != TOTAL_WEIGHT {
            return Err(CriteriaError::WeightMismatch { actual_sum });
        }
        Ok(())
    }

    /// Turn admin drafts into criteria. The sum is not checked here so a category can be
    /// saved while its weights are still being balanced.
    pub fn prepare(&self, drafts: Vec<CriterionDraft>) -> Result<Vec<Criterion>, CriteriaError> {
        let mut seen = HashSet::new();
        let mut criteria = Vec::with_capacity(drafts.len());

        for (index, draft) in drafts.into_iter().enumerate() {
            let name = draft.name.trim().to_string();
            if name.is_empty() {
                return Err(CriteriaError::UnnamedCriterion { position: index + 1 });
            }
            let weight = u8::try_from(draft.weight)
                .ok()
                .filter(|weight| (1..=100).contains(weight))
                .ok_or_else(|| CriteriaError::WeightOutOfRange {
                    name: name.clone(),
                    weight: draft.weight,
                })?;

            let id = match draft.id {
                Some(id) if !id.0.trim().is_empty() => CriterionId(id.0.trim().to_string()),
                _ => CriterionId(format!("k{}", index + 1)),
            };
            if !seen.insert(id.clone()) {
                return Err(CriteriaError::DuplicateCriterion(id));
            }

            criteria.push(Criterion { id, name, weight });
        }

        Ok(criteria)
    }

    pub fn report(&self, criteria: &[Criterion]) -> CriteriaReport {
        let total_weight = criteria.iter().map(|criterion| u32::from(criterion.weight)).sum();
        CriteriaReport {
            valid: self.validate(criteria).is_ok(),
            total_weight,
            criteria: criteria.len(),
        }
    }
}

/// Result of validating a category's criteria, as shown next to the scoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CriteriaReport {
    pub valid: bool,
    pub total_weight: u32,
    pub criteria: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("criteria weights sum to {actual_sum}, expected {TOTAL_WEIGHT}")]
    WeightMismatch { actual_sum: u32 },
    #[error("criterion {name} has weight {weight}; weights must be between 1 and 100")]
    WeightOutOfRange { name: String, weight: i64 },
    #[error("criterion #{position} has no name")]
    UnnamedCriterion { position: usize },
    #[error("criterion {0} is listed more than once")]
    DuplicateCriterion(CriterionId),
}

impl CriteriaError {
    pub const fn code(&self) -> &'static str {
        match self {
            CriteriaError::WeightMismatch { .. } => "WEIGHT_MISMATCH",
            CriteriaError::WeightOutOfRange { .. } => "WEIGHT_OUT_OF_RANGE",
            CriteriaError::UnnamedCriterion { .. } => "UNNAMED_CRITERION",
            CriteriaError::DuplicateCriterion(_) => "DUPLICATE_CRITERION",
        }
    }
}
