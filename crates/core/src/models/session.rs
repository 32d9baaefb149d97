use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingError;

/// Shortest bookable session, in minutes.
pub const MIN_SESSION_MINUTES: i64 = 30;
/// Longest bookable session, in minutes.
pub const MAX_SESSION_MINUTES: i64 = 4 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    RescheduleRequested,
    Cancelled,
    Completed,
}

impl SessionStatus {
    /// Statuses shown in a participant's upcoming list.
    pub const UPCOMING: [SessionStatus; 3] = [
        SessionStatus::Pending,
        SessionStatus::Confirmed,
        SessionStatus::RescheduleRequested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::RescheduleRequested => "reschedule_requested",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn is_upcoming(&self) -> bool {
        Self::UPCOMING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Cancelled | SessionStatus::Completed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "confirmed" => Ok(SessionStatus::Confirmed),
            "reschedule_requested" => Ok(SessionStatus::RescheduleRequested),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "completed" => Ok(SessionStatus::Completed),
            other => Err(BookingError::Validation(format!(
                "Unknown session status: {}",
                other
            ))),
        }
    }
}

/// The state a reschedule negotiation started from.
///
/// Captured once when a confirmed session first moves into
/// `reschedule_requested`. Counter-proposals only move `proposed_by`;
/// the original times and status survive until the negotiation closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiation {
    pub original_start: DateTime<Utc>,
    pub original_end: DateTime<Utc>,
    pub original_status: SessionStatus,
    /// Party behind the latest proposal. `None` when the negotiation was
    /// reconstructed from a change event that did not name a proposer.
    pub proposed_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub room_id: Option<String>,
    pub negotiation: Option<Negotiation>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }

    /// The other party of the session, if `user_id` is one of them.
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.student_id {
            Some(self.tutor_id)
        } else if user_id == self.tutor_id {
            Some(self.student_id)
        } else {
            None
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status.is_upcoming() && self.start_time >= now
    }
}

/// A session as shown in a participant's list, joined with the other party's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionListing {
    #[serde(flatten)]
    pub session: Session,
    pub counterpart_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub tutor_id: Uuid,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A validated booking ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSessionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub session: Session,
    pub warning: Option<String>,
}

/// Which sessions a participant's live list follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    pub participant_id: Uuid,
    pub starts_after: DateTime<Utc>,
    pub statuses: Vec<SessionStatus>,
}

impl SessionFilter {
    pub fn upcoming_for(participant_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            participant_id,
            starts_after: now,
            statuses: SessionStatus::UPCOMING.to_vec(),
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        session.is_participant(self.participant_id)
            && session.start_time >= self.starts_after
            && self.statuses.contains(&session.status)
    }
}
