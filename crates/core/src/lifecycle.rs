//! # Booking lifecycle
//!
//! The legal transitions of a session and who may trigger them:
//!
//! | From                   | Action  | Actor                        | To                     |
//! |------------------------|---------|------------------------------|------------------------|
//! | pending                | confirm | the tutor, or system         | confirmed              |
//! | pending, confirmed, reschedule_requested | cancel | student or tutor | cancelled     |
//! | confirmed, reschedule_requested | propose | student or tutor     | reschedule_requested   |
//! | reschedule_requested   | accept  | party that did not propose   | confirmed              |
//! | reschedule_requested   | decline | party that did not propose   | original status        |
//! | confirmed              | complete| system, after the end time   | completed              |
//!
//! Every function here is pure: it inspects the current row and returns the
//! next one (version bumped, `updated_at` refreshed) or the reason the action
//! is refused. Persisting the result is the caller's job.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{ActorContext, Role};
use crate::errors::{BookingError, BookingResult};
use crate::models::session::{
    CreateSessionRequest, MAX_SESSION_MINUTES, MIN_SESSION_MINUTES, Negotiation, NewSession,
    RescheduleRequest, Session, SessionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Confirm,
    Cancel,
    ProposeReschedule,
    AcceptReschedule,
    DeclineReschedule,
    Complete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Confirm => "confirm",
            Action::Cancel => "cancel",
            Action::ProposeReschedule => "reschedule",
            Action::AcceptReschedule => "accept the reschedule of",
            Action::DeclineReschedule => "decline the reschedule of",
            Action::Complete => "complete",
        }
    }

    /// Statuses this action may start from.
    pub fn allowed_from(&self) -> &'static [SessionStatus] {
        match self {
            Action::Confirm => &[SessionStatus::Pending],
            Action::Cancel => &[
                SessionStatus::Pending,
                SessionStatus::Confirmed,
                SessionStatus::RescheduleRequested,
            ],
            Action::ProposeReschedule => &[
                SessionStatus::Confirmed,
                SessionStatus::RescheduleRequested,
            ],
            Action::AcceptReschedule | Action::DeclineReschedule => {
                &[SessionStatus::RescheduleRequested]
            }
            Action::Complete => &[SessionStatus::Confirmed],
        }
    }

    pub fn is_allowed_from(&self, status: SessionStatus) -> bool {
        self.allowed_from().contains(&status)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a legal action: the row as it should be stored next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    /// Status and version the conditional update must still find.
    pub from: SessionStatus,
    pub expected_version: i64,
    pub session: Session,
}

/// Checks a start/end pair for a new booking or a reschedule proposal.
pub fn validate_schedule(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> BookingResult<()> {
    if end <= start {
        return Err(BookingError::Validation(
            "End time must be after start time".to_string(),
        ));
    }

    let duration = end - start;
    if duration < Duration::minutes(MIN_SESSION_MINUTES)
        || duration > Duration::minutes(MAX_SESSION_MINUTES)
    {
        return Err(BookingError::Validation(format!(
            "Session must last between {} minutes and {} hours",
            MIN_SESSION_MINUTES,
            MAX_SESSION_MINUTES / 60
        )));
    }

    if start <= now {
        return Err(BookingError::Validation(
            "Start time must be in the future".to_string(),
        ));
    }

    Ok(())
}

/// Validates a booking request from a student.
pub fn create(
    actor: &ActorContext,
    request: CreateSessionRequest,
    now: DateTime<Utc>,
) -> BookingResult<NewSession> {
    if actor.role != Role::Student {
        return Err(BookingError::Forbidden(
            "Only students can book sessions".to_string(),
        ));
    }

    let subject = request.subject.trim();
    if subject.is_empty() {
        return Err(BookingError::Validation("Subject is required".to_string()));
    }
    if request.tutor_id == actor.user_id {
        return Err(BookingError::Validation(
            "Students cannot book themselves as tutor".to_string(),
        ));
    }

    validate_schedule(request.start_time, request.end_time, now)?;

    Ok(NewSession {
        student_id: actor.user_id,
        tutor_id: request.tutor_id,
        subject: subject.to_string(),
        start_time: request.start_time,
        end_time: request.end_time,
        notes: non_blank(request.notes),
    })
}

pub fn confirm(
    session: &Session,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    let is_tutor = actor.role == Role::Tutor && actor.user_id == session.tutor_id;
    if !(is_tutor || actor.is_system()) {
        return Err(BookingError::Forbidden(
            "Only the tutor can confirm this session".to_string(),
        ));
    }
    require_status(session, Action::Confirm)?;

    let mut next = advance(session, now);
    next.status = SessionStatus::Confirmed;
    Ok(transition(Action::Confirm, session, next))
}

/// Cancels the session. An open negotiation is closed and the agreed time
/// kept on record.
pub fn cancel(
    session: &Session,
    actor: &ActorContext,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    require_party(session, actor)?;
    require_status(session, Action::Cancel)?;

    let mut next = advance(session, now);
    if let Some(negotiation) = next.negotiation.take() {
        next.start_time = negotiation.original_start;
        next.end_time = negotiation.original_end;
    }
    next.status = SessionStatus::Cancelled;
    next.cancellation_reason = non_blank(reason);
    Ok(transition(Action::Cancel, session, next))
}

/// Proposes a new time. The first proposal snapshots the agreed time and
/// status; counter-proposals keep that snapshot and only move the proposal.
pub fn propose(
    session: &Session,
    actor: &ActorContext,
    proposal: RescheduleRequest,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    require_party(session, actor)?;
    require_status(session, Action::ProposeReschedule)?;

    let negotiation = match (session.status, &session.negotiation) {
        (SessionStatus::RescheduleRequested, Some(open)) => Negotiation {
            proposed_by: Some(actor.user_id),
            ..open.clone()
        },
        (SessionStatus::RescheduleRequested, None) => {
            return Err(BookingError::MissingSnapshot(session.id));
        }
        _ => Negotiation {
            original_start: session.start_time,
            original_end: session.end_time,
            original_status: session.status,
            proposed_by: Some(actor.user_id),
        },
    };

    validate_schedule(proposal.start, proposal.end, now)?;

    let mut next = advance(session, now);
    next.start_time = proposal.start;
    next.end_time = proposal.end;
    next.status = SessionStatus::RescheduleRequested;
    next.negotiation = Some(negotiation);
    Ok(transition(Action::ProposeReschedule, session, next))
}

/// Accepts the latest proposal; the proposed time becomes final.
pub fn accept(
    session: &Session,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    open_negotiation(session, actor, Action::AcceptReschedule)?;

    let mut next = advance(session, now);
    next.status = SessionStatus::Confirmed;
    next.negotiation = None;
    Ok(transition(Action::AcceptReschedule, session, next))
}

/// Declines the latest proposal and restores the time and status the
/// negotiation started from.
pub fn decline(
    session: &Session,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    let negotiation = open_negotiation(session, actor, Action::DeclineReschedule)?;

    let mut next = advance(session, now);
    next.start_time = negotiation.original_start;
    next.end_time = negotiation.original_end;
    next.status = negotiation.original_status;
    next.negotiation = None;
    Ok(transition(Action::DeclineReschedule, session, next))
}

/// Marks a confirmed session as held once its end time has passed.
pub fn complete(
    session: &Session,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> BookingResult<Transition> {
    if !actor.is_system() {
        return Err(BookingError::Forbidden(
            "Sessions are completed automatically".to_string(),
        ));
    }
    require_status(session, Action::Complete)?;
    if now < session.end_time {
        return Err(BookingError::Precondition(
            "Session has not ended yet".to_string(),
        ));
    }

    let mut next = advance(session, now);
    next.status = SessionStatus::Completed;
    Ok(transition(Action::Complete, session, next))
}

fn require_party(session: &Session, actor: &ActorContext) -> BookingResult<()> {
    let is_party = match actor.role {
        Role::Student => actor.user_id == session.student_id,
        Role::Tutor => actor.user_id == session.tutor_id,
        Role::System => false,
    };

    if is_party {
        Ok(())
    } else {
        Err(BookingError::Forbidden(
            "Only the student or tutor of this session can do that".to_string(),
        ))
    }
}

fn require_status(session: &Session, action: Action) -> BookingResult<()> {
    if action.is_allowed_from(session.status) {
        Ok(())
    } else {
        Err(BookingError::Precondition(format!(
            "Cannot {} a session that is {}",
            action, session.status
        )))
    }
}

/// Checks shared by accept and decline; returns the open negotiation.
fn open_negotiation<'a>(
    session: &'a Session,
    actor: &ActorContext,
    action: Action,
) -> BookingResult<&'a Negotiation> {
    require_party(session, actor)?;
    require_status(session, action)?;

    let negotiation = session
        .negotiation
        .as_ref()
        .ok_or(BookingError::MissingSnapshot(session.id))?;
    let proposer = negotiation
        .proposed_by
        .ok_or(BookingError::MissingSnapshot(session.id))?;

    if proposer == actor.user_id {
        return Err(BookingError::Forbidden(
            "You cannot respond to your own proposal".to_string(),
        ));
    }

    Ok(negotiation)
}

fn advance(session: &Session, now: DateTime<Utc>) -> Session {
    let mut next = session.clone();
    next.version = session.version + 1;
    next.updated_at = now;
    next
}

fn transition(action: Action, current: &Session, next: Session) -> Transition {
    Transition {
        action,
        from: current.status,
        expected_version: current.version,
        session: next,
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
