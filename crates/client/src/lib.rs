use std::sync::Arc;

use eyre::Result;
use sqlx::PgPool;
use tracing::{info, warn};
use tutorbook_db::{PgChangeFeed, PgStore};

pub mod config;
pub mod live;

pub use live::{FeedState, LiveSessions};

/// Follow the configured participant's upcoming sessions and log every change.
///
/// Runs until the change feed gives up, which is reported as an error.
pub async fn watch_sessions(config: config::ClientConfig, db_pool: PgPool) -> Result<()> {
    info!(
        user_id = %config.actor.user_id,
        role = %config.actor.role,
        "Watching upcoming sessions"
    );

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let feed = Arc::new(PgChangeFeed::new(db_pool));
    let live = LiveSessions::spawn(store, feed, config.actor, config.retry);

    follow_sessions(&live).await
}

/// Log the live list until the change feed gives up or the task stops.
///
/// Returns an error once the feed reaches [`FeedState::Failed`].
pub async fn follow_sessions(live: &LiveSessions) -> Result<()> {
    let mut listings = live.listings();
    let mut state = live.state();

    loop {
        gave_up(live)?;

        tokio::select! {
            changed = listings.changed() => {
                if changed.is_err() {
                    break;
                }
                for listing in listings.borrow_and_update().iter() {
                    let session = &listing.session;
                    info!(
                        session_id = %session.id,
                        subject = %session.subject,
                        status = %session.status,
                        start = %session.start_time,
                        with = listing.counterpart_name.as_deref().unwrap_or("unknown"),
                        "Upcoming session"
                    );
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(state = ?*state.borrow_and_update(), "Feed state changed");
            }
        }
    }

    gave_up(live)
}

fn gave_up(live: &LiveSessions) -> Result<()> {
    match live.current_state() {
        FeedState::Failed { reason } => {
            warn!("Live updates stopped: {}", reason);
            Err(eyre::eyre!(reason))
        }
        _ => Ok(()),
    }
}
