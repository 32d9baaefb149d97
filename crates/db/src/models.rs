use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorbook_core::errors::BookingError;
use tutorbook_core::models::notification::Notification;
use tutorbook_core::models::session::{Negotiation, Session, SessionListing};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub id: Uuid,
    pub student_id: Uuid,
    pub tutor_id: Uuid,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub room_id: Option<String>,
    pub original_start_time: Option<DateTime<Utc>>,
    pub original_end_time: Option<DateTime<Utc>>,
    pub original_status: Option<String>,
    pub proposed_by: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSessionListing {
    #[sqlx(flatten)]
    pub session: DbSession,
    pub counterpart_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbSession> for Session {
    type Error = BookingError;

    fn try_from(row: DbSession) -> Result<Self, Self::Error> {
        // Rows missing any snapshot column carry no negotiation
        let negotiation = match (
            row.original_start_time,
            row.original_end_time,
            row.original_status.as_deref(),
        ) {
            (Some(original_start), Some(original_end), Some(original_status)) => {
                Some(Negotiation {
                    original_start,
                    original_end,
                    original_status: original_status.parse()?,
                    proposed_by: row.proposed_by,
                })
            }
            _ => None,
        };

        Ok(Session {
            id: row.id,
            student_id: row.student_id,
            tutor_id: row.tutor_id,
            subject: row.subject,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status.parse()?,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            room_id: row.room_id,
            negotiation,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbSessionListing> for SessionListing {
    type Error = BookingError;

    fn try_from(row: DbSessionListing) -> Result<Self, Self::Error> {
        Ok(SessionListing {
            session: row.session.try_into()?,
            counterpart_name: row.counterpart_name,
        })
    }
}

impl TryFrom<DbNotification> for Notification {
    type Error = BookingError;

    fn try_from(row: DbNotification) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            sender_id: row.sender_id,
            content: row.content,
            kind: row.kind.parse()?,
            link: row.link,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}
