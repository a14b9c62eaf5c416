use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AdminGate, Business, MentorGate, ParticipantTrack};

/// Mutations a business registration accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    MentorApprove,
    MentorReject { reason: Option<String> },
    AdminApprove,
    AdminReject { reason: Option<String> },
    AssignBooth { booth_number: String },
    Cancel,
}

impl Command {
    pub(crate) fn action(&self) -> ParticipationAction {
        match self {
            Command::MentorApprove => ParticipationAction::MentorApprove,
            Command::MentorReject { .. } => ParticipationAction::MentorReject,
            Command::AdminApprove => ParticipationAction::AdminApprove,
            Command::AdminReject { .. } => ParticipationAction::AdminReject,
            Command::AssignBooth { .. } => ParticipationAction::AssignBooth,
            Command::Cancel => ParticipationAction::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationAction {
    MentorApprove,
    MentorReject,
    AdminApprove,
    AdminReject,
    AssignBooth,
    Cancel,
}

impl ParticipationAction {
    pub const fn label(self) -> &'static str {
        match self {
            ParticipationAction::MentorApprove => "mentor-approve",
            ParticipationAction::MentorReject => "mentor-reject",
            ParticipationAction::AdminApprove => "admin-approve",
            ParticipationAction::AdminReject => "admin-reject",
            ParticipationAction::AssignBooth => "assign booth to",
            ParticipationAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for ParticipationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Transition was not permitted from the business's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Refused(pub ParticipationAction);

/// Apply `command` to `business` in place. Guards only look at the business itself; event
/// lock and status checks belong to the caller.
pub(crate) fn apply(
    business: &mut Business,
    command: Command,
    now: DateTime<Utc>,
) -> Result<(), Refused> {
    let action = command.action();
    if business.is_terminal() {
        return Err(Refused(action));
    }

    match command {
        Command::MentorApprove => {
            let gate = pending_mentor_gate(&mut business.track).ok_or(Refused(action))?;
            *gate = MentorGate::Disetujui { decided_at: now };
        }
        Command::MentorReject { reason } => {
            let gate = pending_mentor_gate(&mut business.track).ok_or(Refused(action))?;
            *gate = MentorGate::Ditolak {
                reason: normalize_note(reason),
                decided_at: now,
            };
        }
        Command::AdminApprove => {
            let mentor_cleared = match &business.track {
                ParticipantTrack::Mahasiswa { mentor, .. } => {
                    matches!(mentor, MentorGate::Disetujui { .. })
                }
                ParticipantTrack::UmkmLuar { .. } => true,
            };
            if !mentor_cleared || business.admin != AdminGate::Pending {
                return Err(Refused(action));
            }
            business.admin = AdminGate::Disetujui {
                decided_at: now,
                booth_number: None,
            };
        }
        Command::AdminReject { reason } => {
            if business.admin != AdminGate::Pending {
                return Err(Refused(action));
            }
            business.admin = AdminGate::Ditolak {
                reason: normalize_note(reason),
                decided_at: now,
            };
        }
        Command::AssignBooth { booth_number: next } => match &mut business.admin {
            AdminGate::Disetujui { booth_number, .. } => *booth_number = Some(next),
            AdminGate::Pending | AdminGate::Ditolak { .. } => return Err(Refused(action)),
        },
        Command::Cancel => business.cancelled_at = Some(now),
    }

    Ok(())
}

fn pending_mentor_gate(track: &mut ParticipantTrack) -> Option<&mut MentorGate> {
    match track {
        ParticipantTrack::Mahasiswa { mentor, .. } if *mentor == MentorGate::Pending => {
            Some(mentor)
        }
        _ => None,
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
