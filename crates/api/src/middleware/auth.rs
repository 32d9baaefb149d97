//! # Authentication Module
//!
//! Identity is established upstream. The gateway in front of the API sets
//! two headers on every request:
//!
//! - `x-user-id`: the caller's profile UUID
//! - `x-user-role`: `student`, `tutor` or `system`
//!
//! [`CurrentActor`] turns them into an [`ActorContext`] for each request, so
//! the booking service always receives the identity explicitly.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tutorbook_core::{
    context::{ActorContext, Role},
    errors::{BookingError, BookingResult},
    repository::IdentityProvider,
};
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Reads the actor from the identity headers of one request.
pub struct HeaderIdentity<'a> {
    headers: &'a HeaderMap,
}

impl<'a> HeaderIdentity<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self { headers }
    }

    fn header(&self, name: &str) -> BookingResult<&'a str> {
        self.headers
            .get(name)
            .ok_or_else(|| BookingError::Forbidden(format!("Missing {} header", name)))?
            .to_str()
            .map_err(|_| BookingError::Validation(format!("Invalid {} header", name)))
    }
}

impl IdentityProvider for HeaderIdentity<'_> {
    fn current_actor(&self) -> BookingResult<ActorContext> {
        let user_id = Uuid::parse_str(self.header(USER_ID_HEADER)?.trim()).map_err(|_| {
            BookingError::Validation(format!("{} must be a UUID", USER_ID_HEADER))
        })?;
        let role: Role = self.header(USER_ROLE_HEADER)?.parse()?;

        Ok(ActorContext::new(user_id, role))
    }
}

/// Extractor for the acting user of a request.
///
/// Rejects with 403 when the identity headers are missing and with 400 when
/// they are malformed.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub ActorContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = HeaderIdentity::new(&parts.headers).current_actor()?;
        Ok(CurrentActor(actor))
    }
}
