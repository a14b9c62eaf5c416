use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::actors::UserId;

/// Identifier wrapper for UMKM mentoring records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UmkmId(pub String);

impl fmt::Display for UmkmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mentoring milestone number, always within `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tahap(u8);

impl Tahap {
    pub const FIRST: Tahap = Tahap(1);
    pub const LAST: Tahap = Tahap(4);
    pub const COUNT: usize = 4;

    pub fn new(value: u8) -> Result<Self, InvalidTahap> {
        if (1..=Self::LAST.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidTahap(i64::from(value)))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Next milestone; the last one stays put.
    pub const fn advanced(self) -> Tahap {
        if self.0 >= Self::LAST.0 {
            self
        } else {
            Tahap(self.0 + 1)
        }
    }

    pub(crate) const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = Tahap> {
        (1..=Self::LAST.0).map(Tahap)
    }
}

impl TryFrom<u8> for Tahap {
    type Error = InvalidTahap;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Tahap::new(value)
    }
}

impl TryFrom<i64> for Tahap {
    type Error = InvalidTahap;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| InvalidTahap(value))
            .and_then(Tahap::new)
    }
}

impl From<Tahap> for u8 {
    fn from(value: Tahap) -> Self {
        value.0
    }
}

impl fmt::Display for Tahap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tahap {0} is outside 1..=4")]
pub struct InvalidTahap(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    BelumDimulai,
    SedangProses,
    MenungguValidasi,
    Selesai,
}

impl StageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StageStatus::BelumDimulai => "BELUM_DIMULAI",
            StageStatus::SedangProses => "SEDANG_PROSES",
            StageStatus::MenungguValidasi => "MENUNGGU_VALIDASI",
            StageStatus::Selesai => "SELESAI",
        }
    }

    pub const fn accepts_uploads(self) -> bool {
        matches!(self, StageStatus::BelumDimulai | StageStatus::SedangProses)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored reference to an uploaded document; the bytes live in external file storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFile {
    pub name: String,
    pub url: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// File reference returned by the storage service, as posted by the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub tahap: Tahap,
    pub status: StageStatus,
    pub files: Vec<StageFile>,
    pub catatan: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<UserId>,
}

impl Stage {
    pub fn not_started(tahap: Tahap) -> Self {
        Self {
            tahap,
            status: StageStatus::BelumDimulai,
            files: Vec::new(),
            catatan: None,
            submitted_at: None,
            validated_at: None,
            validated_by: None,
        }
    }
}

/// External UMKM in the four-stage mentoring programme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Umkm {
    pub id: UmkmId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(rename = "tahap_saat_ini")]
    pub current_stage: Tahap,
    pub stages: [Stage; Tahap::COUNT],
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Umkm {
    /// New record at stage 1 with every stage `BELUM_DIMULAI`.
    pub fn new(id: UmkmId, owner_id: UserId, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            name,
            current_stage: Tahap::FIRST,
            stages: std::array::from_fn(|index| Stage::not_started(Tahap(index as u8 + 1))),
            created_at,
            version: 0,
        }
    }

    pub fn stage(&self, tahap: Tahap) -> &Stage {
        &self.stages[tahap.index()]
    }

    pub(crate) fn stage_mut(&mut self, tahap: Tahap) -> &mut Stage {
        &mut self.stages[tahap.index()]
    }

    /// True once the last stage has been validated.
    pub fn is_complete(&self) -> bool {
        self.stage(Tahap::LAST).status == StageStatus::Selesai
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmkmRegistration {
    pub owner_id: UserId,
    pub name: String,
}

/// Admin queue entry for a stage waiting on validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingValidation {
    pub umkm_id: UmkmId,
    pub umkm_name: String,
    pub tahap: Tahap,
    pub files: usize,
    pub submitted_at: Option<DateTime<Utc>>,
}
