//! # Booking service
//!
//! Runs one action end to end: load the session, check the action with the
//! [`lifecycle`](crate::lifecycle) rules, store the result with a
//! status/version guard and notify the counter-party.
//!
//! Store failures are returned as-is and never retried, so a failed action
//! has no side effects beyond what the store already applied. Notification
//! failures do not undo the transition; they come back as a warning on the
//! [`TransitionOutcome`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::ActorContext;
use crate::errors::{BookingError, BookingResult};
use crate::lifecycle::{self, Action, Transition};
use crate::models::session::{
    CreateSessionRequest, RescheduleRequest, Session, SessionFilter, SessionListing,
    TransitionResponse,
};
use crate::notify;
use crate::repository::{NotificationStore, SessionStore};

/// A stored transition, plus a warning when the counter-party could not be
/// notified.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub session: Session,
    pub warning: Option<BookingError>,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        TransitionResponse {
            session: outcome.session,
            warning: outcome.warning.map(|w| w.to_string()),
        }
    }
}

type InFlight = Mutex<HashSet<(Uuid, Action)>>;

pub struct BookingService {
    sessions: Arc<dyn SessionStore>,
    notifications: Arc<dyn NotificationStore>,
    in_flight: InFlight,
}

impl BookingService {
    pub fn new(sessions: Arc<dyn SessionStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            sessions,
            notifications,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Books a new session for the acting student. Starts out `pending`.
    pub async fn create(
        &self,
        actor: &ActorContext,
        request: CreateSessionRequest,
    ) -> BookingResult<Session> {
        let new_session = lifecycle::create(actor, request, Utc::now())?;
        let session = self.sessions.insert_session(&new_session).await?;

        info!(
            session_id = %session.id,
            student_id = %session.student_id,
            tutor_id = %session.tutor_id,
            "Session booked"
        );
        Ok(session)
    }

    pub async fn confirm(&self, actor: &ActorContext, id: Uuid) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::Confirm, |session, now| {
            lifecycle::confirm(session, actor, now)
        })
        .await
    }

    pub async fn cancel(
        &self,
        actor: &ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::Cancel, |session, now| {
            lifecycle::cancel(session, actor, reason, now)
        })
        .await
    }

    pub async fn propose_reschedule(
        &self,
        actor: &ActorContext,
        id: Uuid,
        proposal: RescheduleRequest,
    ) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::ProposeReschedule, |session, now| {
            lifecycle::propose(session, actor, proposal, now)
        })
        .await
    }

    pub async fn accept_reschedule(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::AcceptReschedule, |session, now| {
            lifecycle::accept(session, actor, now)
        })
        .await
    }

    pub async fn decline_reschedule(
        &self,
        actor: &ActorContext,
        id: Uuid,
    ) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::DeclineReschedule, |session, now| {
            lifecycle::decline(session, actor, now)
        })
        .await
    }

    pub async fn complete(&self, actor: &ActorContext, id: Uuid) -> BookingResult<TransitionOutcome> {
        self.run(actor, id, Action::Complete, |session, now| {
            lifecycle::complete(session, actor, now)
        })
        .await
    }

    /// The acting user's upcoming sessions, soonest first.
    pub async fn upcoming(&self, actor: &ActorContext) -> BookingResult<Vec<SessionListing>> {
        if actor.is_system() {
            return Err(BookingError::Forbidden(
                "The system has no sessions of its own".to_string(),
            ));
        }
        let filter = SessionFilter::upcoming_for(actor.user_id, Utc::now());
        self.sessions.list_upcoming(&filter).await
    }

    async fn run<F>(
        &self,
        actor: &ActorContext,
        id: Uuid,
        action: Action,
        step: F,
    ) -> BookingResult<TransitionOutcome>
    where
        F: FnOnce(&Session, DateTime<Utc>) -> BookingResult<Transition>,
    {
        let _claim = InFlightClaim::acquire(&self.in_flight, id, action)?;

        let current = self
            .sessions
            .get_session(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Session with ID {} not found", id)))?;

        let transition = step(&current, Utc::now())?;
        let stored = self.sessions.apply_transition(&transition).await?;

        info!(
            session_id = %id,
            action = ?action,
            actor_id = %actor.user_id,
            from = %transition.from,
            to = %stored.status,
            version = stored.version,
            "Session transition applied"
        );

        let warning = self.notify_counterpart(action, &stored, actor).await;
        Ok(TransitionOutcome {
            session: stored,
            warning,
        })
    }

    async fn notify_counterpart(
        &self,
        action: Action,
        session: &Session,
        actor: &ActorContext,
    ) -> Option<BookingError> {
        let notice = notify::notice_for(action, session, actor)?;

        match self.notifications.insert_notification(&notice).await {
            Ok(notification) => {
                debug!(
                    notification_id = %notification.id,
                    recipient_id = %notification.recipient_id,
                    kind = %notification.kind,
                    "Notification sent"
                );
                None
            }
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    recipient_id = %notice.recipient_id,
                    error = %e,
                    "Failed to write notification"
                );
                Some(BookingError::NotificationWrite(e.to_string()))
            }
        }
    }
}

/// Marks an action on a session as in flight until dropped.
struct InFlightClaim<'a> {
    set: &'a InFlight,
    key: (Uuid, Action),
}

impl<'a> InFlightClaim<'a> {
    fn acquire(set: &'a InFlight, id: Uuid, action: Action) -> BookingResult<Self> {
        let key = (id, action);
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);

        if inserted {
            Ok(Self { set, key })
        } else {
            Err(BookingError::Busy(format!(
                "already trying to {} session {}",
                action, id
            )))
        }
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
