use anyhow::Result;
use sqlx::Row;
use time::Date;
use uuid::Uuid;

use crate::domain::birthday::Birthday;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct BirthdayService {
    db: Db,
}

const BIRTHDAY_COLUMNS: &str = "id, user_id, name, birthday, email, phone, \
     reminder_days, notes, is_active, created_at";

/// Field set accepted by create and update.
#[derive(Debug, Clone)]
pub struct BirthdayInput {
    pub name: String,
    pub birthday: Date,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub reminder_days: i32,
    pub notes: Option<String>,
}

impl BirthdayService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Active birthdays owned by `user_id`, ordered by name.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Birthday>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM birthdays \
             WHERE user_id = $1 AND is_active = TRUE \
             ORDER BY name ASC",
            BIRTHDAY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(map_birthday).collect())
    }

    pub async fn create(&self, user_id: Uuid, input: BirthdayInput) -> Result<Birthday> {
        let row = sqlx::query(&format!(
            "INSERT INTO birthdays \
             (id, user_id, name, birthday, email, phone, reminder_days, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {}",
            BIRTHDAY_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.name)
        .bind(input.birthday)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.reminder_days)
        .bind(&input.notes)
        .fetch_one(self.db.pool())
        .await?;

        Ok(map_birthday(row))
    }

    /// Owner-scoped update; `None` when the row does not exist, is inactive,
    /// or belongs to someone else.
    pub async fn update(
        &self,
        birthday_id: Uuid,
        user_id: Uuid,
        input: BirthdayInput,
    ) -> Result<Option<Birthday>> {
        let row = sqlx::query(&format!(
            "UPDATE birthdays \
             SET name = $3, birthday = $4, email = $5, phone = $6, \
                 reminder_days = $7, notes = $8 \
             WHERE id = $1 AND user_id = $2 AND is_active = TRUE \
             RETURNING {}",
            BIRTHDAY_COLUMNS
        ))
        .bind(birthday_id)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.birthday)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.reminder_days)
        .bind(&input.notes)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(map_birthday))
    }

    /// Soft delete: the row stays, `is_active` flips. Every read path
    /// filters on the flag.
    pub async fn soft_delete(&self, birthday_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE birthdays SET is_active = FALSE \
             WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
        )
        .bind(birthday_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Single active birthday, owner-scoped. Used by the manual send path.
    pub async fn get(&self, birthday_id: Uuid, user_id: Uuid) -> Result<Option<Birthday>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM birthdays \
             WHERE id = $1 AND user_id = $2 AND is_active = TRUE",
            BIRTHDAY_COLUMNS
        ))
        .bind(birthday_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(map_birthday))
    }
}

pub(crate) fn map_birthday(row: sqlx::postgres::PgRow) -> Birthday {
    Birthday {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        birthday: row.get("birthday"),
        email: row.get("email"),
        phone: row.get("phone"),
        reminder_days: row.get("reminder_days"),
        notes: row.get("notes"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}
