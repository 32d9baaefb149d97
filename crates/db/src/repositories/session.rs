use crate::models::{DbSession, DbSessionListing};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use tutorbook_core::models::session::{NewSession, Session, SessionStatus};
use uuid::Uuid;

pub async fn create_session(pool: &Pool<Postgres>, new_session: &NewSession) -> Result<DbSession> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating session: id={}, student_id={}, tutor_id={}",
        id, new_session.student_id, new_session.tutor_id
    );

    let session = sqlx::query_as::<_, DbSession>(
        r#"
        INSERT INTO sessions (id, student_id, tutor_id, subject, start_time, end_time,
                              status, notes, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $9)
        RETURNING id, student_id, tutor_id, subject, start_time, end_time, status, notes,
                  cancellation_reason, room_id, original_start_time, original_end_time,
                  original_status, proposed_by, version, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(new_session.student_id)
    .bind(new_session.tutor_id)
    .bind(&new_session.subject)
    .bind(new_session.start_time)
    .bind(new_session.end_time)
    .bind(SessionStatus::Pending.as_str())
    .bind(&new_session.notes)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

pub async fn get_session_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSession>> {
    let session = sqlx::query_as::<_, DbSession>(
        r#"
        SELECT id, student_id, tutor_id, subject, start_time, end_time, status, notes,
               cancellation_reason, room_id, original_start_time, original_end_time,
               original_status, proposed_by, version, created_at, updated_at
        FROM sessions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Writes the lifecycle columns of `session` if the stored row still has
/// `expected_status` and `expected_version`. Returns `None` when it does not.
pub async fn update_session_guarded(
    pool: &Pool<Postgres>,
    session: &Session,
    expected_status: SessionStatus,
    expected_version: i64,
) -> Result<Option<DbSession>> {
    let negotiation = session.negotiation.as_ref();

    let updated = sqlx::query_as::<_, DbSession>(
        r#"
        UPDATE sessions
        SET start_time = $4,
            end_time = $5,
            status = $6,
            cancellation_reason = $7,
            original_start_time = $8,
            original_end_time = $9,
            original_status = $10,
            proposed_by = $11,
            version = $12,
            updated_at = $13
        WHERE id = $1 AND status = $2 AND version = $3
        RETURNING id, student_id, tutor_id, subject, start_time, end_time, status, notes,
                  cancellation_reason, room_id, original_start_time, original_end_time,
                  original_status, proposed_by, version, created_at, updated_at
        "#,
    )
    .bind(session.id)
    .bind(expected_status.as_str())
    .bind(expected_version)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.status.as_str())
    .bind(&session.cancellation_reason)
    .bind(negotiation.map(|n| n.original_start))
    .bind(negotiation.map(|n| n.original_end))
    .bind(negotiation.map(|n| n.original_status.as_str()))
    .bind(negotiation.and_then(|n| n.proposed_by))
    .bind(session.version)
    .bind(session.updated_at)
    .fetch_optional(pool)
    .await?;

    Ok(updated)
}

/// Sessions of a participant starting at or after `starts_after`, soonest
/// first, with the other party's display name.
pub async fn get_upcoming_sessions(
    pool: &Pool<Postgres>,
    participant_id: Uuid,
    starts_after: DateTime<Utc>,
    statuses: &[SessionStatus],
) -> Result<Vec<DbSessionListing>> {
    let statuses: Vec<&str> = statuses.iter().map(SessionStatus::as_str).collect();

    let listings = sqlx::query_as::<_, DbSessionListing>(
        r#"
        SELECT s.id, s.student_id, s.tutor_id, s.subject, s.start_time, s.end_time, s.status,
               s.notes, s.cancellation_reason, s.room_id, s.original_start_time,
               s.original_end_time, s.original_status, s.proposed_by, s.version,
               s.created_at, s.updated_at,
               p.full_name AS counterpart_name
        FROM sessions s
        LEFT JOIN profiles p
            ON p.id = CASE WHEN s.student_id = $1 THEN s.tutor_id ELSE s.student_id END
        WHERE (s.student_id = $1 OR s.tutor_id = $1)
          AND s.start_time >= $2
          AND s.status = ANY($3)
        ORDER BY s.start_time ASC, s.id ASC
        "#,
    )
    .bind(participant_id)
    .bind(starts_after)
    .bind(statuses)
    .fetch_all(pool)
    .await?;

    Ok(listings)
}
