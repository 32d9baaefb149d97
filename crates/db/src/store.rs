//! Postgres implementation of the booking store traits.

use async_trait::async_trait;
use tracing::debug;
use tutorbook_core::errors::{BookingError, BookingResult};
use tutorbook_core::lifecycle::Transition;
use tutorbook_core::models::notification::{NewNotification, Notification};
use tutorbook_core::models::session::{NewSession, Session, SessionFilter, SessionListing};
use tutorbook_core::repository::{NotificationStore, SessionStore};
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{notification, session};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, new_session: &NewSession) -> BookingResult<Session> {
        session::create_session(&self.pool, new_session)
            .await
            .map_err(|e| insert_error(e, new_session))?
            .try_into()
    }

    async fn get_session(&self, id: Uuid) -> BookingResult<Option<Session>> {
        session::get_session_by_id(&self.pool, id)
            .await?
            .map(Session::try_from)
            .transpose()
    }

    async fn apply_transition(&self, transition: &Transition) -> BookingResult<Session> {
        let updated = session::update_session_guarded(
            &self.pool,
            &transition.session,
            transition.from,
            transition.expected_version,
        )
        .await?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                debug!(
                    "Guarded update matched no row: id={}, status={}, version={}",
                    transition.session.id, transition.from, transition.expected_version
                );
                Err(BookingError::Conflict(transition.session.id))
            }
        }
    }

    async fn list_upcoming(&self, filter: &SessionFilter) -> BookingResult<Vec<SessionListing>> {
        session::get_upcoming_sessions(
            &self.pool,
            filter.participant_id,
            filter.starts_after,
            &filter.statuses,
        )
        .await?
        .into_iter()
        .map(SessionListing::try_from)
        .collect()
    }
}

/// Maps a failed session insert. A missing participant profile surfaces as
/// a foreign key violation and is reported as `NotFound`.
fn insert_error(error: eyre::Report, new_session: &NewSession) -> BookingError {
    let constraint = error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .filter(|e| e.is_foreign_key_violation())
        .map(|e| e.constraint().unwrap_or_default().to_string());

    match constraint.as_deref() {
        Some("sessions_student_id_fkey") => BookingError::NotFound(format!(
            "Student profile with ID {} not found",
            new_session.student_id
        )),
        Some(_) => BookingError::NotFound(format!(
            "Tutor profile with ID {} not found",
            new_session.tutor_id
        )),
        None => BookingError::Store(error),
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(
        &self,
        new_notification: &NewNotification,
    ) -> BookingResult<Notification> {
        notification::create_notification(&self.pool, new_notification)
            .await?
            .try_into()
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> BookingResult<Vec<Notification>> {
        notification::get_notifications_by_recipient(&self.pool, recipient_id, unread_only)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> BookingResult<Notification> {
        notification::mark_notification_read(&self.pool, id, recipient_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Notification with ID {} not found", id)))?
            .try_into()
    }
}
