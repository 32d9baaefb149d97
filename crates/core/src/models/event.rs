use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::session::{Negotiation, Session, SessionStatus};

/// A row change pushed by the store's change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert {
        new: SessionPatch,
    },
    Update {
        new: SessionPatch,
        #[serde(default)]
        old: Option<SessionPatch>,
    },
    Delete {
        old: SessionPatch,
    },
}

impl ChangeEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            ChangeEvent::Insert { new } | ChangeEvent::Update { new, .. } => new.id,
            ChangeEvent::Delete { old } => old.id,
        }
    }

    /// Whether the changed row involves `participant_id`. Rows that do not
    /// name their parties are let through.
    pub fn involves(&self, participant_id: Uuid) -> bool {
        match self {
            ChangeEvent::Insert { new } | ChangeEvent::Update { new, .. } => {
                new.involves(participant_id)
            }
            ChangeEvent::Delete { old } => old.involves(participant_id),
        }
    }
}

/// Session columns as carried by a change event.
///
/// Only `id` is guaranteed. Absent fields leave the local value untouched;
/// nullable columns use a nested option so an explicit `null` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPatch {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SessionPatch {
    pub fn involves(&self, participant_id: Uuid) -> bool {
        match (self.student_id, self.tutor_id) {
            (None, None) => true,
            (student, tutor) => {
                student == Some(participant_id) || tutor == Some(participant_id)
            }
        }
    }

    /// The negotiation carried by the event, when all of its columns are set.
    pub fn negotiation(&self) -> Option<Negotiation> {
        match (
            self.original_start_time,
            self.original_end_time,
            self.original_status,
        ) {
            (Some(original_start), Some(original_end), Some(original_status)) => {
                Some(Negotiation {
                    original_start,
                    original_end,
                    original_status,
                    proposed_by: self.proposed_by,
                })
            }
            _ => None,
        }
    }
}

impl From<&Session> for SessionPatch {
    fn from(session: &Session) -> Self {
        let negotiation = session.negotiation.as_ref();
        Self {
            id: session.id,
            student_id: Some(session.student_id),
            tutor_id: Some(session.tutor_id),
            subject: Some(session.subject.clone()),
            start_time: Some(session.start_time),
            end_time: Some(session.end_time),
            status: Some(session.status),
            notes: Some(session.notes.clone()),
            cancellation_reason: Some(session.cancellation_reason.clone()),
            room_id: Some(session.room_id.clone()),
            original_start_time: negotiation.map(|n| n.original_start),
            original_end_time: negotiation.map(|n| n.original_end),
            original_status: negotiation.map(|n| n.original_status),
            proposed_by: negotiation.and_then(|n| n.proposed_by),
            version: Some(session.version),
            created_at: Some(session.created_at),
            updated_at: Some(session.updated_at),
        }
    }
}
