use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{CriterionId, ScoreSubmission};
use crate::workflows::participation::domain::BusinessId;

#[derive(Debug)]
pub enum ScoreImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ScoreImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreImportError::Io(err) => write!(f, "failed to read score sheet: {}", err),
            ScoreImportError::Csv(err) => write!(f, "invalid score sheet CSV data: {}", err),
        }
    }
}

impl std::error::Error for ScoreImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoreImportError::Io(err) => Some(err),
            ScoreImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ScoreImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ScoreImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads judges' score sheets (`business_id,criterion_id,nilai`). Rows with an empty
/// `nilai` are skipped; range checks are left to the judging service.
pub struct ScoreSheetImporter;

impl ScoreSheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ScoreSubmission>, ScoreImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ScoreSubmission>, ScoreImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut submissions = Vec::new();

        for record in csv_reader.deserialize::<ScoreRow>() {
            let row = record?;
            let Some(nilai) = row.nilai else {
                continue;
            };
            submissions.push(ScoreSubmission {
                business_id: BusinessId(row.business_id),
                criterion_id: CriterionId(row.criterion_id),
                nilai,
            });
        }

        Ok(submissions)
    }
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    business_id: String,
    criterion_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    nilai: Option<i64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("-") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
