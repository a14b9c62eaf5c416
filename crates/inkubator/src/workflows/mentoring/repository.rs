use super::domain::{Umkm, UmkmId};
use crate::workflows::errors::RepositoryError;

/// Storage for UMKM mentoring records. `update_umkm` is a compare-and-swap write on `version`.
pub trait MentoringRepository: Send + Sync {
    fn insert_umkm(&self, umkm: Umkm) -> Result<Umkm, RepositoryError>;
    fn update_umkm(&self, umkm: Umkm, expected_version: u64) -> Result<Umkm, RepositoryError>;
    fn fetch_umkm(&self, id: &UmkmId) -> Result<Option<Umkm>, RepositoryError>;
    /// Records with at least one stage in `MENUNGGU_VALIDASI`.
    fn awaiting_validation(&self) -> Result<Vec<Umkm>, RepositoryError>;
}
