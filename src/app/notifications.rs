use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::Row;
use time::Date;
use uuid::Uuid;

use crate::domain::notification::{Channel, DeliveryStatus, Notification};
use crate::infra::db::Db;

/// Persistence of delivery attempts. The reminder dispatcher and the manual
/// send endpoint both write through this seam.
#[async_trait]
pub trait NotificationRecorder: Send + Sync {
    async fn record(
        &self,
        user_id: Uuid,
        birthday_id: Uuid,
        channel: Channel,
        status: DeliveryStatus,
    ) -> Result<Notification>;
}

/// History entry with the joined birthday fields the client renders.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationHistoryItem {
    #[serde(flatten)]
    pub notification: Notification,
    pub birthday_name: String,
    pub birthday_date: Date,
}

#[derive(Clone)]
pub struct NotificationService {
    db: Db,
}

impl NotificationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Offset-paginated history for one user, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<NotificationHistoryItem>, i64)> {
        let offset = (page - 1) * limit;
        let rows = sqlx::query(
            "SELECT n.id, n.user_id, n.birthday_id, n.channel, n.status, n.sent_at, \
                    b.name AS birthday_name, b.birthday AS birthday_date \
             FROM notifications n \
             JOIN birthdays b ON b.id = n.birthday_id \
             WHERE n.user_id = $1 \
             ORDER BY n.sent_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(NotificationHistoryItem {
                notification: map_notification(&row)?,
                birthday_name: row.get("birthday_name"),
                birthday_date: row.get("birthday_date"),
            });
        }

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?;

        Ok((items, total))
    }
}

#[async_trait]
impl NotificationRecorder for NotificationService {
    async fn record(
        &self,
        user_id: Uuid,
        birthday_id: Uuid,
        channel: Channel,
        status: DeliveryStatus,
    ) -> Result<Notification> {
        let row = sqlx::query(
            "INSERT INTO notifications (id, user_id, birthday_id, channel, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, birthday_id, channel, status, sent_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(birthday_id)
        .bind(channel.as_str())
        .bind(status.as_str())
        .fetch_one(self.db.pool())
        .await?;

        map_notification(&row)
    }
}

fn map_notification(row: &sqlx::postgres::PgRow) -> Result<Notification> {
    let channel: String = row.get("channel");
    let status: String = row.get("status");
    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        birthday_id: row.get("birthday_id"),
        channel: Channel::parse(&channel)
            .ok_or_else(|| anyhow::anyhow!("unknown notification channel: {}", channel))?,
        status: DeliveryStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown notification status: {}", status))?,
        sent_at: row.get("sent_at"),
    })
}
