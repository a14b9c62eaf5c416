//! Participation, judging and mentoring workflows for an entrepreneurship-center portal.
//!
//! The crate exposes three workflow families under [`workflows`]: business participation
//! approval for events, weighted multi-criteria judging, and the four-stage UMKM mentoring
//! pipeline. Each family pairs a pure state machine with a repository-backed service and an
//! axum router.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
