use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{StageFile, StageStatus, Tahap, Umkm};
use crate::workflows::actors::UserId;

/// Mutations a mentoring stage accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StageCommand {
    Upload { files: Vec<StageFile> },
    RequestValidation,
    Validate {
        approved: bool,
        catatan: Option<String>,
        admin_id: UserId,
    },
}

impl StageCommand {
    pub(crate) fn action(&self) -> StageAction {
        match self {
            StageCommand::Upload { .. } => StageAction::UploadFiles,
            StageCommand::RequestValidation => StageAction::RequestValidation,
            StageCommand::Validate { .. } => StageAction::Validate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    UploadFiles,
    RequestValidation,
    Validate,
}

impl StageAction {
    pub const fn label(self) -> &'static str {
        match self {
            StageAction::UploadFiles => "upload files to",
            StageAction::RequestValidation => "request validation of",
            StageAction::Validate => "validate",
        }
    }
}

impl std::fmt::Display for StageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a stage refused a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StageRefusal {
    #[error("tahap {tahap} is not the current stage (tahap {current})")]
    NotCurrentStage { tahap: Tahap, current: Tahap },
    #[error("tahap {tahap} is {status}")]
    Status { tahap: Tahap, status: StageStatus },
    #[error("tahap {tahap} has no files attached")]
    NoFiles { tahap: Tahap },
}

/// Apply `command` to stage `tahap` of `umkm` in place. Nothing is mutated when the command
/// is refused.
pub(crate) fn apply(
    umkm: &mut Umkm,
    tahap: Tahap,
    command: StageCommand,
    now: DateTime<Utc>,
) -> Result<(), StageRefusal> {
    let current = umkm.current_stage;
    if tahap > current {
        return Err(StageRefusal::NotCurrentStage { tahap, current });
    }

    match command {
        StageCommand::Upload { files } => {
            if tahap != current {
                return Err(StageRefusal::NotCurrentStage { tahap, current });
            }
            let stage = umkm.stage_mut(tahap);
            if !stage.status.accepts_uploads() {
                return Err(StageRefusal::Status {
                    tahap,
                    status: stage.status,
                });
            }
            stage.status = StageStatus::SedangProses;
            stage.files.extend(files);
        }
        StageCommand::RequestValidation => {
            if tahap != current {
                return Err(StageRefusal::NotCurrentStage { tahap, current });
            }
            let stage = umkm.stage_mut(tahap);
            if stage.status != StageStatus::SedangProses {
                return Err(StageRefusal::Status {
                    tahap,
                    status: stage.status,
                });
            }
            if stage.files.is_empty() {
                return Err(StageRefusal::NoFiles { tahap });
            }
            stage.status = StageStatus::MenungguValidasi;
            stage.submitted_at = Some(now);
        }
        StageCommand::Validate {
            approved,
            catatan,
            admin_id,
        } => {
            let stage = umkm.stage_mut(tahap);
            if stage.status != StageStatus::MenungguValidasi {
                return Err(StageRefusal::Status {
                    tahap,
                    status: stage.status,
                });
            }
            stage.status = if approved {
                StageStatus::Selesai
            } else {
                StageStatus::SedangProses
            };
            stage.catatan = normalize_note(catatan);
            stage.validated_at = Some(now);
            stage.validated_by = Some(admin_id);

            if approved && tahap == current {
                umkm.current_stage = current.advanced();
            }
        }
    }

    Ok(())
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
