use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route(
            "/api/sessions/upcoming",
            get(handlers::sessions::upcoming_sessions),
        )
        .route(
            "/api/sessions/:id/confirm",
            post(handlers::sessions::confirm_session),
        )
        .route(
            "/api/sessions/:id/cancel",
            post(handlers::sessions::cancel_session),
        )
        .route(
            "/api/sessions/:id/reschedule",
            post(handlers::sessions::propose_reschedule),
        )
        .route(
            "/api/sessions/:id/reschedule/accept",
            post(handlers::sessions::accept_reschedule),
        )
        .route(
            "/api/sessions/:id/reschedule/decline",
            post(handlers::sessions::decline_reschedule),
        )
        .route(
            "/api/sessions/:id/complete",
            post(handlers::sessions::complete_session),
        )
}
