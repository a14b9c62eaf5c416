//! Dual-gate participation approval for event registrations.
//!
//! Student (MAHASISWA) businesses pass a mentor gate and then an admin gate; external
//! (UMKM_LUAR) businesses only pass the admin gate. Booths are assigned after admin approval
//! and every mutation is refused while the event is locked.

pub mod domain;
pub(crate) mod machine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AdminGate, Business, BusinessId, BusinessKind, BusinessView, Event, EventDraft, EventId,
    EventStatus, MentorGate, MentorStatus, ParticipantTrack, RegistrationRequest,
    RegistrationWindow,
};
pub use machine::ParticipationAction;
pub use repository::ParticipationRepository;
pub use router::participation_router;
pub use service::{ParticipationError, ParticipationService};
