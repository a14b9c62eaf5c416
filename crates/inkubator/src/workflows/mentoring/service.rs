use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::domain::{
    FileUpload, InvalidTahap, PendingValidation, StageFile, StageStatus, Tahap, Umkm, UmkmId,
    UmkmRegistration,
};
use super::pipeline::{self, StageAction, StageCommand, StageRefusal};
use super::repository::MentoringRepository;
use crate::workflows::actors::UserId;
use crate::workflows::errors::{RepositoryError, WorkflowErrorKind};
use crate::workflows::notifications::{dispatch, Notification, NotificationPublisher};

/// Four-stage UMKM mentoring pipeline over a repository.
pub struct MentoringService<M, N> {
    repository: Arc<M>,
    notifications: Arc<N>,
}

static UMKM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_umkm_id() -> UmkmId {
    let id = UMKM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UmkmId(format!("umkm-{id:06}"))
}

impl<M, N> MentoringService<M, N>
where
    M: MentoringRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<M>, notifications: Arc<N>) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    pub fn register(&self, registration: UmkmRegistration) -> Result<Umkm, MentoringError> {
        let name = registration.name.trim().to_string();
        if name.is_empty() {
            return Err(MentoringError::Invalid(
                "UMKM name must not be empty".to_string(),
            ));
        }

        let umkm = Umkm::new(next_umkm_id(), registration.owner_id, name, Utc::now());
        let stored = self.repository.insert_umkm(umkm)?;
        info!(umkm_id = %stored.id, owner_id = %stored.owner_id, "umkm registered");
        Ok(stored)
    }

    pub fn umkm(&self, umkm_id: &UmkmId) -> Result<Umkm, MentoringError> {
        Ok(self.load(umkm_id)?)
    }

    /// Append files to the current stage. Uploads are cumulative.
    pub fn upload_files(
        &self,
        umkm_id: &UmkmId,
        tahap: Tahap,
        uploaded_by: &UserId,
        uploads: Vec<FileUpload>,
    ) -> Result<Umkm, MentoringError> {
        if uploads.is_empty() {
            return Err(MentoringError::Invalid(
                "at least one file is required".to_string(),
            ));
        }

        let now = Utc::now();
        let mut files = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let name = upload.name.trim().to_string();
            let url = upload.url.trim().to_string();
            if name.is_empty() || url.is_empty() {
                return Err(MentoringError::Invalid(
                    "uploaded files need a name and a storage URL".to_string(),
                ));
            }
            let content_type = mime_guess::from_path(&name)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            files.push(StageFile {
                name,
                url,
                content_type,
                uploaded_at: now,
            });
        }

        self.transition(umkm_id, tahap, StageCommand::Upload { files }, |umkm| {
            ensure_owner(umkm, uploaded_by)
        })
    }

    pub fn request_validation(
        &self,
        umkm_id: &UmkmId,
        tahap: Tahap,
        requested_by: &UserId,
    ) -> Result<Umkm, MentoringError> {
        let stored = self.transition(umkm_id, tahap, StageCommand::RequestValidation, |umkm| {
            ensure_owner(umkm, requested_by)
        })?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new("stage_validation_requested", "admin", stored.id.0.clone())
                .with_detail("umkm", stored.name.clone())
                .with_detail("tahap", tahap.to_string()),
        );
        Ok(stored)
    }

    /// Admin decision on a stage waiting for validation.
    pub fn validate(
        &self,
        umkm_id: &UmkmId,
        tahap: Tahap,
        admin_id: &UserId,
        approved: bool,
        catatan: Option<String>,
    ) -> Result<Umkm, MentoringError> {
        let command = StageCommand::Validate {
            approved,
            catatan,
            admin_id: admin_id.clone(),
        };
        let stored = self.transition(umkm_id, tahap, command, |_| Ok(()))?;

        let template = if approved {
            "stage_approved"
        } else {
            "stage_rejected"
        };
        let mut notification =
            Notification::new(template, stored.owner_id.0.clone(), stored.id.0.clone())
                .with_detail("tahap", tahap.to_string())
                .with_detail("tahap_saat_ini", stored.current_stage.to_string());
        if let Some(catatan) = &stored.stage(tahap).catatan {
            notification = notification.with_detail("catatan", catatan.clone());
        }
        dispatch(self.notifications.as_ref(), notification);
        Ok(stored)
    }

    /// Stages waiting on an admin, oldest submission first.
    pub fn validation_queue(&self) -> Result<Vec<PendingValidation>, MentoringError> {
        let mut queue: Vec<PendingValidation> = self
            .repository
            .awaiting_validation()?
            .into_iter()
            .flat_map(|umkm| {
                umkm.stages
                    .iter()
                    .filter(|stage| stage.status == StageStatus::MenungguValidasi)
                    .map(|stage| PendingValidation {
                        umkm_id: umkm.id.clone(),
                        umkm_name: umkm.name.clone(),
                        tahap: stage.tahap,
                        files: stage.files.len(),
                        submitted_at: stage.submitted_at,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        queue.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.umkm_id.cmp(&b.umkm_id))
                .then_with(|| a.tahap.cmp(&b.tahap))
        });
        Ok(queue)
    }

    fn transition<G>(
        &self,
        umkm_id: &UmkmId,
        tahap: Tahap,
        command: StageCommand,
        guard: G,
    ) -> Result<Umkm, MentoringError>
    where
        G: FnOnce(&Umkm) -> Result<(), MentoringError>,
    {
        let action = command.action();
        let mut umkm = self.load(umkm_id)?;
        guard(&umkm)?;

        let expected = umkm.version;
        if let Err(refusal) = pipeline::apply(&mut umkm, tahap, command, Utc::now()) {
            return Err(MentoringError::InvalidTransition {
                action,
                refusal,
                current: Box::new(umkm),
            });
        }

        let stored = self.repository.update_umkm(umkm, expected)?;
        info!(
            umkm_id = %stored.id,
            tahap = tahap.get(),
            action = action.label(),
            status = stored.stage(tahap).status.label(),
            tahap_saat_ini = stored.current_stage.get(),
            "stage transition applied"
        );
        Ok(stored)
    }

    fn load(&self, umkm_id: &UmkmId) -> Result<Umkm, RepositoryError> {
        self.repository
            .fetch_umkm(umkm_id)?
            .ok_or_else(|| RepositoryError::not_found("umkm", umkm_id.0.clone()))
    }
}

fn ensure_owner(umkm: &Umkm, user_id: &UserId) -> Result<(), MentoringError> {
    if &umkm.owner_id != user_id {
        return Err(MentoringError::NotOwner {
            umkm_id: umkm.id.clone(),
            user_id: user_id.clone(),
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum MentoringError {
    #[error("cannot {action} tahap: {refusal}")]
    InvalidTransition {
        action: StageAction,
        refusal: StageRefusal,
        current: Box<Umkm>,
    },
    #[error("{user_id} does not own UMKM {umkm_id}")]
    NotOwner { umkm_id: UmkmId, user_id: UserId },
    #[error(transparent)]
    Tahap(#[from] InvalidTahap),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MentoringError {
    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            MentoringError::InvalidTransition { .. } => WorkflowErrorKind::InvalidTransition,
            MentoringError::NotOwner { .. } => WorkflowErrorKind::Forbidden,
            MentoringError::Tahap(_) | MentoringError::Invalid(_) => WorkflowErrorKind::Validation,
            MentoringError::Repository(error) => error.kind(),
        }
    }

    pub fn current_state(&self) -> Option<Value> {
        match self {
            MentoringError::InvalidTransition { current, .. } => {
                serde_json::to_value(current.as_ref()).ok()
            }
            _ => None,
        }
    }
}
