//! A participant's upcoming sessions, kept current from the change feed.
//!
//! [`LiveSessions::spawn`] starts a task that owns the [`SessionList`] and
//! publishes it over a `watch` channel, along with the [`FeedState`] of the
//! subscription. Each connection subscribes first and fetches the baseline
//! second, so no change between the two is missed. A lost connection is
//! retried with exponential backoff; after too many consecutive failures the
//! task publishes [`FeedState::Failed`] and stops.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tutorbook_core::context::ActorContext;
use tutorbook_core::errors::{BookingError, BookingResult};
use tutorbook_core::models::event::ChangeEvent;
use tutorbook_core::models::session::{SessionFilter, SessionListing};
use tutorbook_core::reconcile::{Reconciled, SessionList};
use tutorbook_core::repository::{ChangeFeed, SessionStore};

use crate::config::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Connecting,
    Live,
    Reconnecting { attempt: u32 },
    Failed { reason: String },
}

impl FeedState {
    pub fn is_live(&self) -> bool {
        matches!(self, FeedState::Live)
    }
}

/// Handle to the background task. Dropping it stops the task.
pub struct LiveSessions {
    listings: watch::Receiver<Vec<SessionListing>>,
    state: watch::Receiver<FeedState>,
    task: JoinHandle<()>,
}

impl LiveSessions {
    pub fn spawn(
        store: Arc<dyn SessionStore>,
        feed: Arc<dyn ChangeFeed>,
        actor: ActorContext,
        policy: RetryPolicy,
    ) -> Self {
        let (listings_tx, listings) = watch::channel(Vec::new());
        let (state_tx, state) = watch::channel(FeedState::Connecting);

        let worker = Worker {
            store,
            feed,
            actor,
            policy,
            list: SessionList::new(actor.user_id),
            listings_tx,
            state_tx,
        };
        let task = tokio::spawn(worker.run());

        Self {
            listings,
            state,
            task,
        }
    }

    pub fn listings(&self) -> watch::Receiver<Vec<SessionListing>> {
        self.listings.clone()
    }

    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> Vec<SessionListing> {
        self.listings.borrow().clone()
    }

    pub fn current_state(&self) -> FeedState {
        self.state.borrow().clone()
    }
}

impl Drop for LiveSessions {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Worker {
    store: Arc<dyn SessionStore>,
    feed: Arc<dyn ChangeFeed>,
    actor: ActorContext,
    policy: RetryPolicy,
    list: SessionList,
    listings_tx: watch::Sender<Vec<SessionListing>>,
    state_tx: watch::Sender<FeedState>,
}

impl Worker {
    async fn run(mut self) {
        let mut attempt = 0;

        loop {
            let mut reached_live = false;
            let lost = self.connect(&mut reached_live).await;

            if reached_live {
                attempt = 0;
            }
            attempt += 1;

            if !self.policy.allows(attempt) {
                warn!(
                    user_id = %self.actor.user_id,
                    error = %lost,
                    "Giving up on live session updates"
                );
                let reason = BookingError::Subscription("please refresh".to_string());
                self.state_tx.send_replace(FeedState::Failed {
                    reason: reason.to_string(),
                });
                return;
            }

            let delay = self.policy.delay(attempt);
            warn!(
                user_id = %self.actor.user_id,
                error = %lost,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Live session connection lost, retrying"
            );
            self.state_tx.send_replace(FeedState::Reconnecting { attempt });
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs one connection until it is lost and returns why.
    async fn connect(&mut self, reached_live: &mut bool) -> BookingError {
        let filter = SessionFilter::upcoming_for(self.actor.user_id, Utc::now());

        let mut events = match self.feed.subscribe(filter).await {
            Ok(events) => events,
            Err(e) => return e,
        };

        if let Err(e) = self.refetch().await {
            return e;
        }

        *reached_live = true;
        self.state_tx.send_replace(FeedState::Live);
        info!(
            user_id = %self.actor.user_id,
            sessions = self.list.len(),
            "Live session updates connected"
        );

        match self.follow(&mut events).await {
            Ok(()) => BookingError::Subscription("change feed closed".to_string()),
            Err(e) => e,
        }
    }

    async fn follow(&mut self, events: &mut mpsc::Receiver<ChangeEvent>) -> BookingResult<()> {
        while let Some(event) = events.recv().await {
            let outcome = self.list.apply(&event, Utc::now());
            debug!(session_id = %event.session_id(), ?outcome, "Change event applied");

            match outcome {
                Reconciled::Merged | Reconciled::Removed => self.publish(),
                Reconciled::RefetchRequired => self.refetch().await?,
                Reconciled::Unchanged | Reconciled::Stale | Reconciled::Ignored => {}
            }
        }
        Ok(())
    }

    async fn refetch(&mut self) -> BookingResult<()> {
        let now = Utc::now();
        let filter = SessionFilter::upcoming_for(self.actor.user_id, now);
        let fetched = self.store.list_upcoming(&filter).await?;

        self.list.replace_all(fetched, now);
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.listings_tx.send_replace(self.list.listings().to_vec());
    }
}
