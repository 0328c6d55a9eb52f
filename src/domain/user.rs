use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, Time};
use uuid::Uuid;

/// An account holder. Credential material lives with the auth subsystem and
/// is never loaded by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Device token for push delivery; absent means push is skipped.
    pub push_token: Option<String>,
    /// Wall-clock time of day the user prefers reminders at.
    pub reminder_time: Time,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
