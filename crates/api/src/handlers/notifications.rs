use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;
use tutorbook_core::models::notification::{ListNotificationsQuery, Notification};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::CurrentActor, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notifications
        .list_notifications(actor.user_id, query.unread_only)
        .await?;

    Ok(Json(notifications))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let notification = state.notifications.mark_read(id, actor.user_id).await?;
    Ok(Json(notification))
}
