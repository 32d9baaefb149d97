use crate::models::DbNotification;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use tutorbook_core::models::notification::NewNotification;
use uuid::Uuid;

pub async fn create_notification(
    pool: &Pool<Postgres>,
    notification: &NewNotification,
) -> Result<DbNotification> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (id, recipient_id, sender_id, content, type, link, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        RETURNING id, recipient_id, sender_id, content, type, link, is_read, created_at
        "#,
    )
    .bind(id)
    .bind(notification.recipient_id)
    .bind(notification.sender_id)
    .bind(&notification.content)
    .bind(notification.kind.as_str())
    .bind(&notification.link)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn get_notifications_by_recipient(
    pool: &Pool<Postgres>,
    recipient_id: Uuid,
    unread_only: bool,
) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, recipient_id, sender_id, content, type, link, is_read, created_at
        FROM notifications
        WHERE recipient_id = $1
          AND ($2 = FALSE OR is_read = FALSE)
        ORDER BY created_at DESC
        "#,
    )
    .bind(recipient_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

/// Only the recipient may mark a notification read; returns `None` otherwise.
pub async fn mark_notification_read(
    pool: &Pool<Postgres>,
    id: Uuid,
    recipient_id: Uuid,
) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        UPDATE notifications
        SET is_read = TRUE
        WHERE id = $1 AND recipient_id = $2
        RETURNING id, recipient_id, sender_id, content, type, link, is_read, created_at
        "#,
    )
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}
