use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tutorbook_core::models::session::{
    CancelSessionRequest, CreateSessionRequest, RescheduleRequest, Session, SessionListing,
    TransitionResponse,
};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::CurrentActor, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn create_session(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = state.bookings.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[axum::debug_handler]
pub async fn upcoming_sessions(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<SessionListing>>, AppError> {
    let listings = state.bookings.upcoming(&actor).await?;
    Ok(Json(listings))
}

#[axum::debug_handler]
pub async fn confirm_session(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state.bookings.confirm(&actor, id).await?;
    Ok(Json(outcome.into()))
}

/// The body is optional; `{}` or no body at all cancels without a reason.
#[axum::debug_handler]
pub async fn cancel_session(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelSessionRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let outcome = state.bookings.cancel(&actor, id, reason).await?;
    Ok(Json(outcome.into()))
}

#[axum::debug_handler]
pub async fn propose_reschedule(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state.bookings.propose_reschedule(&actor, id, payload).await?;
    Ok(Json(outcome.into()))
}

#[axum::debug_handler]
pub async fn accept_reschedule(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state.bookings.accept_reschedule(&actor, id).await?;
    Ok(Json(outcome.into()))
}

#[axum::debug_handler]
pub async fn decline_reschedule(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state.bookings.decline_reschedule(&actor, id).await?;
    Ok(Json(outcome.into()))
}

#[axum::debug_handler]
pub async fn complete_session(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResponse>, AppError> {
    let outcome = state.bookings.complete(&actor, id).await?;
    Ok(Json(outcome.into()))
}
