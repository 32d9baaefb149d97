//! Change feed over Postgres `LISTEN`/`NOTIFY`.
//!
//! The `sessions_notify_change` trigger publishes each row change as JSON on
//! [`SESSION_CHANGES_CHANNEL`]. Every subscription holds its own listener
//! connection and forwards the events that involve the filter's participant.
//! When the connection drops the receiver is closed; reconnecting is up to
//! the subscriber.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tutorbook_core::errors::{BookingError, BookingResult};
use tutorbook_core::models::event::ChangeEvent;
use tutorbook_core::models::session::SessionFilter;
use tutorbook_core::repository::ChangeFeed;
use uuid::Uuid;

use crate::DbPool;
use crate::schema::SESSION_CHANGES_CHANNEL;

const DEFAULT_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct PgChangeFeed {
    pool: DbPool,
    buffer: usize,
}

impl PgChangeFeed {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            buffer: DEFAULT_BUFFER,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn subscribe(&self, filter: SessionFilter) -> BookingResult<mpsc::Receiver<ChangeEvent>> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| BookingError::Subscription(e.to_string()))?;
        listener
            .listen(SESSION_CHANGES_CHANNEL)
            .await
            .map_err(|e| BookingError::Subscription(e.to_string()))?;

        info!(
            participant_id = %filter.participant_id,
            channel = SESSION_CHANGES_CHANNEL,
            "Subscribed to session changes"
        );

        let (tx, rx) = mpsc::channel(self.buffer);
        tokio::spawn(forward_events(listener, filter.participant_id, tx));
        Ok(rx)
    }
}

async fn forward_events(
    mut listener: PgListener,
    participant_id: Uuid,
    tx: mpsc::Sender<ChangeEvent>,
) {
    loop {
        let received = tokio::select! {
            _ = tx.closed() => {
                debug!(%participant_id, "Change feed subscriber went away");
                return;
            }
            received = listener.try_recv() => received,
        };

        let notification = match received {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                warn!(%participant_id, "Change feed connection lost");
                return;
            }
            Err(e) => {
                warn!(%participant_id, error = %e, "Change feed failed");
                return;
            }
        };

        let event = match parse_payload(notification.payload()) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed session change");
                continue;
            }
        };

        if !event.involves(participant_id) {
            continue;
        }

        if tx.send(event).await.is_err() {
            return;
        }
    }
}

/// Parses a payload published by the `sessions_notify_change` trigger.
pub fn parse_payload(payload: &str) -> Result<ChangeEvent> {
    serde_json::from_str(payload).wrap_err("Invalid session change payload")
}
