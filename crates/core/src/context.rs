//! Who is acting on a session.
//!
//! Every operation of the booking service receives an [`ActorContext`]
//! explicitly. The context is produced per request by an
//! [`IdentityProvider`](crate::repository::IdentityProvider).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Tutor,
    /// Automated flows such as payment confirmation or the completion sweep.
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            "system" => Ok(Role::System),
            other => Err(BookingError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl ActorContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn student(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Student)
    }

    pub fn tutor(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Tutor)
    }

    pub fn system() -> Self {
        Self::new(Uuid::nil(), Role::System)
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}
