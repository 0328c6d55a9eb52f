use anyhow::Result;
use sqlx::Row;
use time::Time;
use uuid::Uuid;

use crate::domain::user::User;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, push_token, reminder_time, is_active, created_at";

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = $1 AND is_active = TRUE",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(map_user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<String>,
        reminder_time: Option<Time>,
        push_token: Option<Option<String>>,
    ) -> Result<Option<User>> {
        // push_token distinguishes "leave alone" (outer None) from
        // "clear" (Some(None)), so it cannot go through COALESCE.
        let row = sqlx::query(&format!(
            "UPDATE users \
             SET first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 email = COALESCE($4, email), \
                 reminder_time = COALESCE($5, reminder_time), \
                 push_token = CASE WHEN $6 THEN $7 ELSE push_token END \
             WHERE id = $1 AND is_active = TRUE \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(reminder_time)
        .bind(push_token.is_some())
        .bind(push_token.flatten())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(map_user))
    }
}

pub(crate) fn map_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        push_token: row.get("push_token"),
        reminder_time: row.get("reminder_time"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}
