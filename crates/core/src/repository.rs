//! Collaborators the booking core depends on.
//!
//! The persistence store, its change feed and the identity provider are
//! external services; these traits are the contracts an adapter provides.

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::context::ActorContext;
use crate::errors::BookingResult;
use crate::lifecycle::Transition;
use crate::models::event::ChangeEvent;
use crate::models::notification::{NewNotification, Notification};
use crate::models::session::{NewSession, Session, SessionFilter, SessionListing};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &NewSession) -> BookingResult<Session>;

    async fn get_session(&self, id: Uuid) -> BookingResult<Option<Session>>;

    /// Stores `transition.session` only if the row still has the status and
    /// version the transition was computed from. Fails with
    /// [`BookingError::Conflict`](crate::errors::BookingError::Conflict)
    /// otherwise.
    async fn apply_transition(&self, transition: &Transition) -> BookingResult<Session>;

    /// Sessions matching the filter, ordered by start time ascending.
    async fn list_upcoming(&self, filter: &SessionFilter) -> BookingResult<Vec<SessionListing>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> BookingResult<Notification>;

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> BookingResult<Vec<Notification>>;

    /// Marks a notification read on behalf of its recipient.
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> BookingResult<Notification>;
}

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription. The receiver closes when the connection is lost.
    async fn subscribe(&self, filter: SessionFilter) -> BookingResult<mpsc::Receiver<ChangeEvent>>;
}

pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> BookingResult<ActorContext>;
}

/// An identity fixed at construction, e.g. from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub ActorContext);

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> BookingResult<ActorContext> {
        Ok(self.0)
    }
}
