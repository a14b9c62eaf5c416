use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::actors::UserId;

/// Identifier wrapper for events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Identifier wrapper for registered businesses (usaha).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusinessId(pub String);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an event; only moves forward one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Terbuka,
    Berlangsung,
    Selesai,
}

impl EventStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Terbuka => "TERBUKA",
            EventStatus::Berlangsung => "BERLANGSUNG",
            EventStatus::Selesai => "SELESAI",
        }
    }

    pub const fn successor(self) -> Option<Self> {
        match self {
            EventStatus::Draft => Some(EventStatus::Terbuka),
            EventStatus::Terbuka => Some(EventStatus::Berlangsung),
            EventStatus::Berlangsung => Some(EventStatus::Selesai),
            EventStatus::Selesai => None,
        }
    }

    pub const fn accepts_registrations(self) -> bool {
        matches!(self, EventStatus::Terbuka)
    }

    /// Approval, booth and cancellation changes stop once the event has finished.
    pub const fn accepts_participation_changes(self) -> bool {
        !matches!(self, EventStatus::Selesai)
    }

    pub const fn accepts_scores(self) -> bool {
        matches!(self, EventStatus::Berlangsung)
    }

    pub const fn accepts_winner_selection(self) -> bool {
        matches!(self, EventStatus::Berlangsung | EventStatus::Selesai)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl RegistrationWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.opens_at <= at && at <= self.closes_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub status: EventStatus,
    pub registration: RegistrationWindow,
    pub quota: Option<u32>,
    #[serde(rename = "terkunci")]
    pub locked: bool,
    pub version: u64,
}

/// Admin input for a new event; events start in `DRAFT`, unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub registration: RegistrationWindow,
    #[serde(default)]
    pub quota: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessKind {
    Mahasiswa,
    UmkmLuar,
}

/// Mentor (pendampingan) gate for student businesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MentorGate {
    Pending,
    Disetujui {
        decided_at: DateTime<Utc>,
    },
    Ditolak {
        reason: Option<String>,
        decided_at: DateTime<Utc>,
    },
}

/// Admin participation gate (`disetujui`). A booth can only exist on an approved gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminGate {
    Pending,
    Disetujui {
        decided_at: DateTime<Utc>,
        booth_number: Option<String>,
    },
    Ditolak {
        reason: Option<String>,
        decided_at: DateTime<Utc>,
    },
}

/// Who owns the registration. Only the student track carries a mentor gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantTrack {
    Mahasiswa {
        owner_id: UserId,
        mentor_id: UserId,
        mentor: MentorGate,
    },
    UmkmLuar {
        owner_name: String,
        registered_by: UserId,
    },
}

/// Mentor status as shown on badges, including the cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MentorStatus {
    Pending,
    Disetujui,
    Ditolak,
    Dibatalkan,
}

impl MentorStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MentorStatus::Pending => "PENDING",
            MentorStatus::Disetujui => "DISETUJUI",
            MentorStatus::Ditolak => "DITOLAK",
            MentorStatus::Dibatalkan => "DIBATALKAN",
        }
    }
}

/// Registered participant entry of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub event_id: EventId,
    pub name: String,
    pub track: ParticipantTrack,
    pub admin: AdminGate,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub version: u64,
}

impl Business {
    pub fn kind(&self) -> BusinessKind {
        match self.track {
            ParticipantTrack::Mahasiswa { .. } => BusinessKind::Mahasiswa,
            ParticipantTrack::UmkmLuar { .. } => BusinessKind::UmkmLuar,
        }
    }

    /// The user allowed to act on behalf of the business.
    pub fn owner_id(&self) -> &UserId {
        match &self.track {
            ParticipantTrack::Mahasiswa { owner_id, .. } => owner_id,
            ParticipantTrack::UmkmLuar { registered_by, .. } => registered_by,
        }
    }

    pub fn mentor_id(&self) -> Option<&UserId> {
        match &self.track {
            ParticipantTrack::Mahasiswa { mentor_id, .. } => Some(mentor_id),
            ParticipantTrack::UmkmLuar { .. } => None,
        }
    }

    pub fn mentor_gate(&self) -> Option<&MentorGate> {
        match &self.track {
            ParticipantTrack::Mahasiswa { mentor, .. } => Some(mentor),
            ParticipantTrack::UmkmLuar { .. } => None,
        }
    }

    pub fn mentor_status(&self) -> Option<MentorStatus> {
        let gate = self.mentor_gate()?;
        if self.is_cancelled() {
            return Some(MentorStatus::Dibatalkan);
        }
        Some(match gate {
            MentorGate::Pending => MentorStatus::Pending,
            MentorGate::Disetujui { .. } => MentorStatus::Disetujui,
            MentorGate::Ditolak { .. } => MentorStatus::Ditolak,
        })
    }

    /// `None` while the admin decision is pending.
    pub fn disetujui(&self) -> Option<bool> {
        match self.admin {
            AdminGate::Pending => None,
            AdminGate::Disetujui { .. } => Some(true),
            AdminGate::Ditolak { .. } => Some(false),
        }
    }

    pub fn booth_number(&self) -> Option<&str> {
        match &self.admin {
            AdminGate::Disetujui { booth_number, .. } => booth_number.as_deref(),
            _ => None,
        }
    }

    /// Latest rejection note visible to the owner, admin rejection first.
    pub fn rejection_reason(&self) -> Option<&str> {
        if let AdminGate::Ditolak { reason, .. } = &self.admin {
            return reason.as_deref();
        }
        match self.mentor_gate() {
            Some(MentorGate::Ditolak { reason, .. }) => reason.as_deref(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.admin, AdminGate::Ditolak { .. })
            || matches!(self.mentor_gate(), Some(MentorGate::Ditolak { .. }))
    }

    pub fn is_terminal(&self) -> bool {
        self.is_cancelled() || self.is_rejected()
    }

    /// Approved by the admin and still active: may be booth-assigned and judged.
    pub fn is_participating(&self) -> bool {
        self.disetujui() == Some(true) && !self.is_cancelled()
    }

    pub fn view(&self) -> BusinessView {
        BusinessView {
            business_id: self.id.clone(),
            event_id: self.event_id.clone(),
            name: self.name.clone(),
            kind: self.kind(),
            mentor_status: self.mentor_status(),
            disetujui: self.disetujui(),
            booth_number: self.booth_number().map(str::to_string),
            rejection_reason: self.rejection_reason().map(str::to_string),
            cancelled: self.is_cancelled(),
            registered_at: self.registered_at,
        }
    }
}

/// Registration form submitted by an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationRequest {
    Mahasiswa {
        name: String,
        owner_id: UserId,
        mentor_id: UserId,
    },
    UmkmLuar {
        name: String,
        owner_name: String,
        registered_by: UserId,
    },
}

impl RegistrationRequest {
    pub fn name(&self) -> &str {
        match self {
            RegistrationRequest::Mahasiswa { name, .. }
            | RegistrationRequest::UmkmLuar { name, .. } => name,
        }
    }
}

/// Flattened state used for badges and button gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessView {
    pub business_id: BusinessId,
    pub event_id: EventId,
    pub name: String,
    pub kind: BusinessKind,
    pub mentor_status: Option<MentorStatus>,
    pub disetujui: Option<bool>,
    pub booth_number: Option<String>,
    pub rejection_reason: Option<String>,
    pub cancelled: bool,
    pub registered_at: DateTime<Utc>,
}
