use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use super::domain::{
    AdminGate, Business, BusinessId, BusinessView, Event, EventDraft, EventId, EventStatus,
    MentorGate, ParticipantTrack, RegistrationRequest,
};
use super::machine::{self, Command, ParticipationAction, Refused};
use super::repository::ParticipationRepository;
use crate::config::WorkflowConfig;
use crate::workflows::actors::UserId;
use crate::workflows::errors::{RepositoryError, WorkflowErrorKind};
use crate::workflows::notifications::{dispatch, Notification, NotificationPublisher};

const MAX_BOOTH_NUMBER_LEN: usize = 16;

/// Service composing event guards, the approval state machine and storage.
pub struct ParticipationService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    policy: WorkflowConfig,
}

static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static BUSINESS_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_event_id() -> EventId {
    let id = EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EventId(format!("event-{id:06}"))
}

fn next_business_id() -> BusinessId {
    let id = BUSINESS_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BusinessId(format!("usaha-{id:06}"))
}

impl<R, N> ParticipationService<R, N>
where
    R: ParticipationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, policy: WorkflowConfig) -> Self {
        Self {
            repository,
            notifications,
            policy,
        }
    }

    pub fn create_event(&self, draft: EventDraft) -> Result<Event, ParticipationError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ParticipationError::Invalid(
                "event name must not be empty".to_string(),
            ));
        }
        if draft.registration.opens_at > draft.registration.closes_at {
            return Err(ParticipationError::Invalid(
                "registration window closes before it opens".to_string(),
            ));
        }
        if draft.quota == Some(0) {
            return Err(ParticipationError::Invalid(
                "quota must be positive when set".to_string(),
            ));
        }

        let event = Event {
            id: next_event_id(),
            name: name.to_string(),
            status: EventStatus::Draft,
            registration: draft.registration,
            quota: draft.quota,
            locked: false,
            version: 0,
        };
        let stored = self.repository.insert_event(event)?;
        info!(event_id = %stored.id, "event created");
        Ok(stored)
    }

    pub fn event(&self, event_id: &EventId) -> Result<Event, ParticipationError> {
        Ok(self.load_event(event_id)?)
    }

    /// Move the event one step forward (`DRAFT → TERBUKA → BERLANGSUNG → SELESAI`).
    pub fn change_event_status(
        &self,
        event_id: &EventId,
        next: EventStatus,
    ) -> Result<Event, ParticipationError> {
        let mut event = self.load_event(event_id)?;
        if event.status.successor() != Some(next) {
            return Err(ParticipationError::EventTransition {
                event_id: event.id,
                from: event.status,
                to: next,
            });
        }

        let expected = event.version;
        event.status = next;
        let stored = self.repository.update_event(event, expected)?;
        info!(event_id = %stored.id, status = stored.status.label(), "event status changed");
        Ok(stored)
    }

    /// Lock or unlock the event. Unlocking is the only change a locked event accepts.
    pub fn set_event_lock(
        &self,
        event_id: &EventId,
        locked: bool,
    ) -> Result<Event, ParticipationError> {
        let mut event = self.load_event(event_id)?;
        if event.locked == locked {
            return Ok(event);
        }

        let expected = event.version;
        event.locked = locked;
        let stored = self.repository.update_event(event, expected)?;
        info!(event_id = %stored.id, locked, "event lock toggled");
        Ok(stored)
    }

    pub fn register(
        &self,
        event_id: &EventId,
        request: RegistrationRequest,
    ) -> Result<Business, ParticipationError> {
        let event = self.load_event(event_id)?;
        let now = Utc::now();
        admit_registration(&event, now)?;

        let name = request.name().trim().to_string();
        if name.is_empty() {
            return Err(ParticipationError::Invalid(
                "business name must not be empty".to_string(),
            ));
        }

        let track = match request {
            RegistrationRequest::Mahasiswa {
                owner_id,
                mentor_id,
                ..
            } => ParticipantTrack::Mahasiswa {
                owner_id,
                mentor_id,
                mentor: MentorGate::Pending,
            },
            RegistrationRequest::UmkmLuar {
                owner_name,
                registered_by,
                ..
            } => {
                let owner_name = owner_name.trim().to_string();
                if owner_name.is_empty() {
                    return Err(ParticipationError::Invalid(
                        "external businesses must declare an owner name".to_string(),
                    ));
                }
                ParticipantTrack::UmkmLuar {
                    owner_name,
                    registered_by,
                }
            }
        };

        let business = Business {
            id: next_business_id(),
            event_id: event.id,
            name,
            track,
            admin: AdminGate::Pending,
            cancelled_at: None,
            registered_at: now,
            version: 0,
        };
        let stored = self
            .repository
            .commit_business(business, None, |event, businesses| {
                admit_registration(event, now)?;
                ensure_quota(event, businesses)
            })?;
        info!(
            business_id = %stored.id,
            event_id = %stored.event_id,
            kind = ?stored.kind(),
            "business registered"
        );

        if let Some(mentor_id) = stored.mentor_id() {
            dispatch(
                self.notifications.as_ref(),
                Notification::new(
                    "mentor_review_requested",
                    mentor_id.0.clone(),
                    stored.id.0.clone(),
                )
                .with_detail("business", stored.name.clone()),
            );
        }

        Ok(stored)
    }

    pub fn business(&self, business_id: &BusinessId) -> Result<Business, ParticipationError> {
        Ok(self.load_business(business_id)?)
    }

    /// Businesses of an event in registration order.
    pub fn businesses(&self, event_id: &EventId) -> Result<Vec<Business>, ParticipationError> {
        let event = self.load_event(event_id)?;
        let mut businesses = self.repository.businesses_for_event(&event.id)?;
        businesses.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(businesses)
    }

    pub fn mentor_approve(
        &self,
        business_id: &BusinessId,
        mentor_id: &UserId,
    ) -> Result<Business, ParticipationError> {
        let stored = self.transition(business_id, Command::MentorApprove, |business| {
            ensure_assigned_mentor(business, mentor_id)
        })?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new(
                "mentor_approved",
                stored.owner_id().0.clone(),
                stored.id.0.clone(),
            ),
        );
        Ok(stored)
    }

    pub fn mentor_reject(
        &self,
        business_id: &BusinessId,
        mentor_id: &UserId,
        reason: Option<String>,
    ) -> Result<Business, ParticipationError> {
        let stored = self.transition(
            business_id,
            Command::MentorReject { reason },
            |business| ensure_assigned_mentor(business, mentor_id),
        )?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new(
                "mentor_rejected",
                stored.owner_id().0.clone(),
                stored.id.0.clone(),
            )
            .with_detail("reason", stored.rejection_reason().unwrap_or_default()),
        );
        Ok(stored)
    }

    pub fn admin_approve(&self, business_id: &BusinessId) -> Result<Business, ParticipationError> {
        let stored = self.transition(business_id, Command::AdminApprove, |_| Ok(()))?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new(
                "participation_approved",
                stored.owner_id().0.clone(),
                stored.id.0.clone(),
            ),
        );
        Ok(stored)
    }

    pub fn admin_reject(
        &self,
        business_id: &BusinessId,
        reason: Option<String>,
    ) -> Result<Business, ParticipationError> {
        let stored = self.transition(business_id, Command::AdminReject { reason }, |_| Ok(()))?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new(
                "participation_rejected",
                stored.owner_id().0.clone(),
                stored.id.0.clone(),
            )
            .with_detail("reason", stored.rejection_reason().unwrap_or_default()),
        );
        Ok(stored)
    }

    pub fn assign_booth(
        &self,
        business_id: &BusinessId,
        booth_number: &str,
    ) -> Result<Business, ParticipationError> {
        let booth_number = booth_number.trim().to_string();
        let command = Command::AssignBooth {
            booth_number: booth_number.clone(),
        };

        let stored = self.transition(business_id, command, |_| {
            if booth_number.is_empty() || booth_number.chars().count() > MAX_BOOTH_NUMBER_LEN {
                return Err(ParticipationError::Invalid(format!(
                    "booth number must be 1-{MAX_BOOTH_NUMBER_LEN} characters"
                )));
            }
            Ok(())
        })?;

        dispatch(
            self.notifications.as_ref(),
            Notification::new(
                "booth_assigned",
                stored.owner_id().0.clone(),
                stored.id.0.clone(),
            )
            .with_detail("booth_number", booth_number),
        );
        Ok(stored)
    }

    pub fn cancel(
        &self,
        business_id: &BusinessId,
        requested_by: &UserId,
    ) -> Result<Business, ParticipationError> {
        self.transition(business_id, Command::Cancel, |business| {
            if business.owner_id() != requested_by {
                return Err(ParticipationError::NotOwner {
                    business_id: business.id.clone(),
                    user_id: requested_by.clone(),
                });
            }
            Ok(())
        })
    }

    /// Shared read-check-write path: lock, event status, caller guard, state machine, then a
    /// CAS write that repeats the event checks (and booth uniqueness) under the store lock.
    fn transition<G>(
        &self,
        business_id: &BusinessId,
        command: Command,
        guard: G,
    ) -> Result<Business, ParticipationError>
    where
        G: FnOnce(&Business) -> Result<(), ParticipationError>,
    {
        let action = command.action();
        let booth_number = match &command {
            Command::AssignBooth { booth_number } if self.policy.unique_booths => {
                Some(booth_number.clone())
            }
            _ => None,
        };
        let mut business = self.load_business(business_id)?;
        let event = self.load_event(&business.event_id)?;
        admit_change(&event, action)?;

        guard(&business)?;

        let expected = business.version;
        if let Err(Refused(action)) = machine::apply(&mut business, command, Utc::now()) {
            return Err(ParticipationError::InvalidTransition {
                action,
                current: Box::new(business.view()),
            });
        }

        let id = business.id.clone();
        let stored = self
            .repository
            .commit_business(business, Some(expected), |event, businesses| {
                admit_change(event, action)?;
                match &booth_number {
                    Some(booth_number) => ensure_booth_free(&id, booth_number, businesses),
                    None => Ok(()),
                }
            })?;
        info!(
            business_id = %stored.id,
            action = action.label(),
            version = stored.version,
            "business transition applied"
        );
        Ok(stored)
    }

    fn load_event(&self, event_id: &EventId) -> Result<Event, RepositoryError> {
        self.repository
            .fetch_event(event_id)?
            .ok_or_else(|| RepositoryError::not_found("event", event_id.0.clone()))
    }

    fn load_business(&self, business_id: &BusinessId) -> Result<Business, RepositoryError> {
        self.repository
            .fetch_business(business_id)?
            .ok_or_else(|| RepositoryError::not_found("business", business_id.0.clone()))
    }
}

fn admit_registration(event: &Event, now: DateTime<Utc>) -> Result<(), ParticipationError> {
    if event.locked {
        return Err(ParticipationError::Locked(event.id.clone()));
    }
    if !event.status.accepts_registrations() {
        return Err(ParticipationError::EventStatus {
            event_id: event.id.clone(),
            status: event.status,
            action: "register for",
        });
    }
    if !event.registration.contains(now) {
        return Err(ParticipationError::RegistrationClosed(event.id.clone()));
    }
    Ok(())
}

fn ensure_quota(event: &Event, businesses: &[&Business]) -> Result<(), ParticipationError> {
    let Some(quota) = event.quota else {
        return Ok(());
    };
    let active = businesses
        .iter()
        .filter(|business| !business.is_cancelled())
        .count();
    if active >= quota as usize {
        return Err(ParticipationError::QuotaReached {
            event_id: event.id.clone(),
            quota,
        });
    }
    Ok(())
}

fn admit_change(event: &Event, action: ParticipationAction) -> Result<(), ParticipationError> {
    if event.locked {
        return Err(ParticipationError::Locked(event.id.clone()));
    }
    if !event.status.accepts_participation_changes() {
        return Err(ParticipationError::EventStatus {
            event_id: event.id.clone(),
            status: event.status,
            action: action.label(),
        });
    }
    Ok(())
}

/// Booth numbers compare case-insensitively; cancelled businesses release theirs.
fn ensure_booth_free(
    business_id: &BusinessId,
    booth_number: &str,
    businesses: &[&Business],
) -> Result<(), ParticipationError> {
    let holder = businesses
        .iter()
        .filter(|other| &other.id != business_id && !other.is_cancelled())
        .find(|other| {
            other
                .booth_number()
                .map(|taken| taken.eq_ignore_ascii_case(booth_number))
                .unwrap_or(false)
        });

    match holder {
        Some(holder) => Err(ParticipationError::BoothTaken {
            booth_number: booth_number.to_string(),
            holder: holder.id.clone(),
        }),
        None => Ok(()),
    }
}

fn ensure_assigned_mentor(
    business: &Business,
    mentor_id: &UserId,
) -> Result<(), ParticipationError> {
    match business.mentor_id() {
        Some(assigned) if assigned == mentor_id => Ok(()),
        // External businesses have no mentor; the state machine reports the transition.
        None => Ok(()),
        Some(_) => Err(ParticipationError::NotAssignedMentor {
            business_id: business.id.clone(),
            user_id: mentor_id.clone(),
        }),
    }
}

/// Error raised by the participation service.
#[derive(Debug, thiserror::Error)]
pub enum ParticipationError {
    #[error("event {0} is locked")]
    Locked(EventId),
    #[error("cannot {action} business {} in its current state", current.business_id)]
    InvalidTransition {
        action: ParticipationAction,
        current: Box<BusinessView>,
    },
    #[error("event {event_id} is {status}; cannot {action} it")]
    EventStatus {
        event_id: EventId,
        status: EventStatus,
        action: &'static str,
    },
    #[error("event {event_id} cannot move from {from} to {to}")]
    EventTransition {
        event_id: EventId,
        from: EventStatus,
        to: EventStatus,
    },
    #[error("registration window for event {0} is closed")]
    RegistrationClosed(EventId),
    #[error("event {event_id} already has {quota} active registrations")]
    QuotaReached { event_id: EventId, quota: u32 },
    #[error("booth {booth_number} is already assigned to {holder}")]
    BoothTaken {
        booth_number: String,
        holder: BusinessId,
    },
    #[error("{user_id} is not the assigned mentor of business {business_id}")]
    NotAssignedMentor {
        business_id: BusinessId,
        user_id: UserId,
    },
    #[error("{user_id} does not own business {business_id}")]
    NotOwner {
        business_id: BusinessId,
        user_id: UserId,
    },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ParticipationError {
    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            ParticipationError::Locked(_) => WorkflowErrorKind::Locked,
            ParticipationError::InvalidTransition { .. }
            | ParticipationError::EventStatus { .. }
            | ParticipationError::EventTransition { .. }
            | ParticipationError::RegistrationClosed(_) => WorkflowErrorKind::InvalidTransition,
            ParticipationError::QuotaReached { .. } | ParticipationError::BoothTaken { .. } => {
                WorkflowErrorKind::Conflict
            }
            ParticipationError::NotAssignedMentor { .. } | ParticipationError::NotOwner { .. } => {
                WorkflowErrorKind::Forbidden
            }
            ParticipationError::Invalid(_) => WorkflowErrorKind::Validation,
            ParticipationError::Repository(error) => error.kind(),
        }
    }

    /// Current business state for `INVALID_TRANSITION` responses so the UI can resync.
    pub fn current_state(&self) -> Option<Value> {
        match self {
            ParticipationError::InvalidTransition { current, .. } => {
                serde_json::to_value(current.as_ref()).ok()
            }
            _ => None,
        }
    }
}
