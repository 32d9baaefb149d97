#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tutorbook_core::context::ActorContext;
use tutorbook_core::models::session::{Session, SessionListing, SessionStatus};
use uuid::Uuid;

/// Fixed "current time" for the pure lifecycle and reconcile tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

pub fn tomorrow_at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, hour, 0, 0).unwrap()
}

pub struct Parties {
    pub student: ActorContext,
    pub tutor: ActorContext,
}

impl Parties {
    pub fn new() -> Self {
        Self {
            student: ActorContext::student(Uuid::new_v4()),
            tutor: ActorContext::tutor(Uuid::new_v4()),
        }
    }

    pub fn session(&self, status: SessionStatus, start: DateTime<Utc>, end: DateTime<Utc>) -> Session {
        Session {
            id: Uuid::new_v4(),
            student_id: self.student.user_id,
            tutor_id: self.tutor.user_id,
            subject: "Algebra".to_string(),
            start_time: start,
            end_time: end,
            status,
            notes: None,
            cancellation_reason: None,
            room_id: None,
            negotiation: None,
            version: 1,
            created_at: now() - Duration::days(1),
            updated_at: now() - Duration::days(1),
        }
    }

    /// A session tomorrow 14:00 to 15:00.
    pub fn algebra(&self, status: SessionStatus) -> Session {
        self.session(status, tomorrow_at(14), tomorrow_at(15))
    }
}

pub fn listing(session: Session) -> SessionListing {
    SessionListing {
        session,
        counterpart_name: Some("Ada Lovelace".to_string()),
    }
}
