use async_trait::async_trait;
use mockall::mock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::BookingResult;
use crate::lifecycle::Transition;
use crate::models::event::ChangeEvent;
use crate::models::notification::{NewNotification, Notification};
use crate::models::session::{NewSession, Session, SessionFilter, SessionListing};
use crate::repository::{ChangeFeed, NotificationStore, SessionStore};

// Mock collaborators for testing
mock! {
    pub SessionStore {}

    #[async_trait]
    impl SessionStore for SessionStore {
        async fn insert_session(&self, session: &NewSession) -> BookingResult<Session>;

        async fn get_session(&self, id: Uuid) -> BookingResult<Option<Session>>;

        async fn apply_transition(&self, transition: &Transition) -> BookingResult<Session>;

        async fn list_upcoming(&self, filter: &SessionFilter) -> BookingResult<Vec<SessionListing>>;
    }
}

mock! {
    pub NotificationStore {}

    #[async_trait]
    impl NotificationStore for NotificationStore {
        async fn insert_notification(
            &self,
            notification: &NewNotification,
        ) -> BookingResult<Notification>;

        async fn list_notifications(
            &self,
            recipient_id: Uuid,
            unread_only: bool,
        ) -> BookingResult<Vec<Notification>>;

        async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> BookingResult<Notification>;
    }
}

mock! {
    pub ChangeFeed {}

    #[async_trait]
    impl ChangeFeed for ChangeFeed {
        async fn subscribe(&self, filter: SessionFilter) -> BookingResult<mpsc::Receiver<ChangeEvent>>;
    }
}
