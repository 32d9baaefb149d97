use eyre::{Result, WrapErr, eyre};
use std::env;
use std::time::Duration;
use tracing::Level;
use tutorbook_core::context::{ActorContext, Role};
use uuid::Uuid;

/// Configuration for the live session watcher.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Database connection URL (required)
    pub database_url: String,
    /// Who the watcher follows sessions for
    pub actor: ActorContext,
    /// Backoff applied when the change feed drops
    pub retry: RetryPolicy,
    pub log_level: Level,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre!("DATABASE_URL environment variable not set"))?;

        let user_id = env::var("CLIENT_USER_ID")
            .map_err(|_| eyre!("CLIENT_USER_ID environment variable not set"))?
            .parse::<Uuid>()
            .wrap_err("CLIENT_USER_ID must be a valid UUID")?;

        let role = env::var("CLIENT_USER_ROLE")
            .map_err(|_| eyre!("CLIENT_USER_ROLE environment variable not set"))?
            .parse::<Role>()
            .map_err(|e| eyre!("{}", e))?;
        if role == Role::System {
            return Err(eyre!("CLIENT_USER_ROLE must be student or tutor"));
        }

        let base_seconds = env::var("FEED_RETRY_BASE_SECONDS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(2);
        let max_attempts = env::var("FEED_MAX_RETRIES")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(3);

        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|level| level.trim().parse::<Level>().ok())
            .unwrap_or(Level::INFO);

        Ok(Self {
            database_url,
            actor: ActorContext::new(user_id, role),
            retry: RetryPolicy::new(Duration::from_secs(base_seconds), max_attempts),
            log_level,
        })
    }
}

/// Exponential backoff for re-opening the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    /// Consecutive failed attempts tolerated before giving up
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    /// Wait before retry number `attempt` (1-based): `base * 2^(attempt - 1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base.saturating_mul(1 << exponent)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 3)
    }
}
