//! Sequential four-stage mentoring pipeline for external UMKM.
//!
//! Only the current stage (`tahap_saat_ini`) accepts uploads and validation requests; an
//! approved validation of the current stage advances the pointer, capped at stage 4.

pub mod domain;
pub(crate) mod pipeline;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    FileUpload, InvalidTahap, PendingValidation, Stage, StageFile, StageStatus, Tahap, Umkm,
    UmkmId, UmkmRegistration,
};
pub use pipeline::{StageAction, StageRefusal};
pub use repository::MentoringRepository;
pub use router::mentoring_router;
pub use service::{MentoringError, MentoringService};
