use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Reschedule details for session {0} are unavailable, please refresh")]
    MissingSnapshot(Uuid),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Session {0} was changed by someone else, please refresh")]
    Conflict(Uuid),

    #[error("Action already in progress: {0}")]
    Busy(String),

    #[error("Store error: {0}")]
    Store(#[from] eyre::Report),

    #[error("Live updates unavailable: {0}")]
    Subscription(String),

    #[error("Notification could not be delivered: {0}")]
    NotificationWrite(String),
}

impl BookingError {
    /// Errors raised by local checks before any store call.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            BookingError::Validation(_)
                | BookingError::Precondition(_)
                | BookingError::MissingSnapshot(_)
                | BookingError::Forbidden(_)
                | BookingError::Busy(_)
        )
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
