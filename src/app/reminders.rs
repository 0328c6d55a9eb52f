use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;
use time::Date;
use tracing::{error, info, warn};

use crate::app::notifications::NotificationRecorder;
use crate::domain::birthday::{short_date, Birthday};
use crate::domain::notification::{Channel, DeliveryStatus};
use crate::domain::user::User;
use crate::infra::db::Db;
use crate::infra::email::EmailSender;
use crate::infra::push::PushSender;

/// A birthday selected for notification together with its owning user.
#[derive(Debug, Clone)]
pub struct DispatchPair {
    pub birthday: Birthday,
    pub owner: User,
}

/// Read side of the reminder run: active birthdays joined to active owners.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn find_active_birthdays_with_owners(&self) -> Result<Vec<DispatchPair>>;
}

pub struct PgReminderStore {
    db: Db,
}

impl PgReminderStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReminderStore for PgReminderStore {
    async fn find_active_birthdays_with_owners(&self) -> Result<Vec<DispatchPair>> {
        // The active predicates are spelled out here on purpose; nothing
        // upstream is trusted to add them.
        let rows = sqlx::query(
            "SELECT b.id AS b_id, b.user_id AS b_user_id, b.name AS b_name, \
                    b.birthday AS b_birthday, b.email AS b_email, b.phone AS b_phone, \
                    b.reminder_days AS b_reminder_days, b.notes AS b_notes, \
                    b.is_active AS b_is_active, b.created_at AS b_created_at, \
                    u.id AS u_id, u.email AS u_email, u.first_name AS u_first_name, \
                    u.last_name AS u_last_name, u.push_token AS u_push_token, \
                    u.reminder_time AS u_reminder_time, u.is_active AS u_is_active, \
                    u.created_at AS u_created_at \
             FROM birthdays b \
             JOIN users u ON u.id = b.user_id \
             WHERE b.is_active = TRUE AND u.is_active = TRUE",
        )
        .fetch_all(self.db.pool())
        .await?;

        let pairs = rows
            .into_iter()
            .map(|row| DispatchPair {
                birthday: Birthday {
                    id: row.get("b_id"),
                    user_id: row.get("b_user_id"),
                    name: row.get("b_name"),
                    birthday: row.get("b_birthday"),
                    email: row.get("b_email"),
                    phone: row.get("b_phone"),
                    reminder_days: row.get("b_reminder_days"),
                    notes: row.get("b_notes"),
                    is_active: row.get("b_is_active"),
                    created_at: row.get("b_created_at"),
                },
                owner: User {
                    id: row.get("u_id"),
                    email: row.get("u_email"),
                    first_name: row.get("u_first_name"),
                    last_name: row.get("u_last_name"),
                    push_token: row.get("u_push_token"),
                    reminder_time: row.get("u_reminder_time"),
                    is_active: row.get("u_is_active"),
                    created_at: row.get("u_created_at"),
                },
            })
            .collect();

        Ok(pairs)
    }
}

/// Selects due birthdays and dispatches reminders through the delivery
/// capabilities, recording one audit row per attempted channel.
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
    push: Arc<dyn PushSender>,
    email: Arc<dyn EmailSender>,
    recorder: Arc<dyn NotificationRecorder>,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        push: Arc<dyn PushSender>,
        email: Arc<dyn EmailSender>,
        recorder: Arc<dyn NotificationRecorder>,
    ) -> Self {
        Self {
            store,
            push,
            email,
            recorder,
        }
    }

    /// Birthdays whose next occurrence is exactly `reminder_days` away from
    /// `today`. A read failure is logged and yields an empty selection; the
    /// next scheduled run reads fresh.
    pub async fn select_due(&self, today: Date) -> Vec<DispatchPair> {
        let pairs = match self.store.find_active_birthdays_with_owners().await {
            Ok(pairs) => pairs,
            Err(err) => {
                error!(error = ?err, "failed to load birthdays for reminder run");
                return Vec::new();
            }
        };

        pairs
            .into_iter()
            .filter(|pair| pair.birthday.is_due(today))
            .collect()
    }

    /// One full daily run: select, then dispatch each pair in order.
    /// Returns the number of pairs processed.
    pub async fn run_once(&self, today: Date) -> usize {
        let due = self.select_due(today).await;
        for pair in &due {
            self.dispatch(pair, today).await;
        }
        info!(count = due.len(), "processed birthday reminders");
        due.len()
    }

    /// Dispatch both channels for one pair. Channel failures are recorded,
    /// never propagated; a bad pair cannot take down the rest of the batch.
    pub async fn dispatch(&self, pair: &DispatchPair, today: Date) {
        let birthday = &pair.birthday;
        let owner = &pair.owner;
        let occurrence = birthday.next_occurrence(today);
        let date_display = short_date(occurrence);
        let days_left = birthday.reminder_days;

        let title = format!("Birthday reminder: {}", birthday.name);
        let body = format!(
            "{} has a birthday on {} ({} days left).",
            birthday.name, date_display, days_left
        );

        // Push is attempted only when the owner registered a token; a
        // missing token is a skip, not a failure.
        if let Some(token) = &owner.push_token {
            let mut data = HashMap::new();
            data.insert("birthdayId".to_string(), birthday.id.to_string());
            data.insert("type".to_string(), "birthday_reminder".to_string());

            let outcome = self.push.send(token, &title, &body, &data).await;
            if let Err(err) = &outcome {
                warn!(
                    error = %err,
                    birthday_id = %birthday.id,
                    "push delivery failed"
                );
            }
            self.record(pair, Channel::Push, outcome.is_ok()).await;
        }

        let html = email_body(birthday, owner, &date_display, days_left);
        let outcome = self.email.send(&owner.email, &title, &html).await;
        if let Err(err) = &outcome {
            warn!(
                error = %err,
                birthday_id = %birthday.id,
                "email delivery failed"
            );
        }
        self.record(pair, Channel::Email, outcome.is_ok()).await;
    }

    async fn record(&self, pair: &DispatchPair, channel: Channel, ok: bool) {
        let status = DeliveryStatus::from_outcome(ok);
        if let Err(err) = self
            .recorder
            .record(pair.owner.id, pair.birthday.id, channel, status)
            .await
        {
            error!(
                error = ?err,
                birthday_id = %pair.birthday.id,
                channel = channel.as_str(),
                "failed to record notification"
            );
        }
    }
}

fn email_body(birthday: &Birthday, owner: &User, date_display: &str, days_left: i32) -> String {
    let mut contact = String::new();
    if let Some(email) = &birthday.email {
        contact.push_str(&format!("<li>Email: {}</li>", email));
    }
    if let Some(phone) = &birthday.phone {
        contact.push_str(&format!("<li>Phone: {}</li>", phone));
    }
    let contact_block = if contact.is_empty() {
        String::new()
    } else {
        format!("<p>Contact details:</p><ul>{}</ul>", contact)
    };
    let notes_block = birthday
        .notes
        .as_ref()
        .map(|notes| format!("<p>Notes: {}</p>", notes))
        .unwrap_or_default();

    format!(
        "<h2>Birthday reminder</h2>\
         <p>Hi {},</p>\
         <p><strong>{}</strong> has a birthday on <strong>{}</strong> ({} days left).</p>\
         {}{}\
         <p>This is an automated message from the Birthday Reminder app.</p>",
        owner.first_name, birthday.name, date_display, days_left, contact_block, notes_block
    )
}
