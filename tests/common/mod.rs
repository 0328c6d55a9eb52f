#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use confetti::app::notifications::NotificationRecorder;
use confetti::app::reminders::{DispatchPair, ReminderStore};
use confetti::domain::birthday::Birthday;
use confetti::domain::notification::{Channel, DeliveryStatus, Notification};
use confetti::domain::user::User;
use confetti::infra::delivery::DeliveryError;
use confetti::infra::email::EmailSender;
use confetti::infra::push::PushSender;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn user(email: &str, push_token: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Uyen".to_string(),
        last_name: "Tran".to_string(),
        push_token: push_token.map(str::to_string),
        reminder_time: Time::MIDNIGHT,
        is_active: true,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn birthday(owner: &User, name: &str, date: Date, reminder_days: i32) -> Birthday {
    Birthday {
        id: Uuid::new_v4(),
        user_id: owner.id,
        name: name.to_string(),
        birthday: date,
        email: None,
        phone: None,
        reminder_days,
        notes: None,
        is_active: true,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn pair(owner: User, birthday: Birthday) -> DispatchPair {
    DispatchPair { birthday, owner }
}

// ---------------------------------------------------------------------------
// In-memory capability implementations
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    pairs: Mutex<Vec<DispatchPair>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay_ms: u64,
}

impl MemoryStore {
    pub fn with_pairs(pairs: Vec<DispatchPair>) -> Self {
        Self {
            pairs: Mutex::new(pairs),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    /// A store whose read takes `delay_ms`, for exercising overlap handling.
    pub fn slow(pairs: Vec<DispatchPair>, delay_ms: u64) -> Self {
        Self {
            pairs: Mutex::new(pairs),
            delay_ms,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn find_active_birthdays_with_owners(&self) -> Result<Vec<DispatchPair>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.pairs.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone)]
pub struct PushCall {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<PushCall>>,
    pub fail: AtomicBool,
}

impl RecordingPush {
    pub fn failing() -> Self {
        let push = Self::default();
        push.fail.store(true, Ordering::SeqCst);
        push
    }
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(PushCall {
            token: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data: data.clone(),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: "push provider down".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EmailCall {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<EmailCall>>,
    pub fail: AtomicBool,
    /// When set, only sends to this recipient fail.
    pub fail_to: Mutex<Option<String>>,
}

impl RecordingEmail {
    pub fn failing() -> Self {
        let email = Self::default();
        email.fail.store(true, Ordering::SeqCst);
        email
    }

    pub fn failing_for(recipient: &str) -> Self {
        let email = Self::default();
        *email.fail_to.lock().unwrap() = Some(recipient.to_string());
        email
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(EmailCall {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        let targeted = self
            .fail_to
            .lock()
            .unwrap()
            .as_deref()
            .map(|recipient| recipient == to)
            .unwrap_or(false);
        if self.fail.load(Ordering::SeqCst) || targeted {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: "mail provider down".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedNotification {
    pub user_id: Uuid,
    pub birthday_id: Uuid,
    pub channel: Channel,
    pub status: DeliveryStatus,
}

#[derive(Default)]
pub struct MemoryRecorder {
    pub records: Mutex<Vec<RecordedNotification>>,
}

#[async_trait]
impl NotificationRecorder for MemoryRecorder {
    async fn record(
        &self,
        user_id: Uuid,
        birthday_id: Uuid,
        channel: Channel,
        status: DeliveryStatus,
    ) -> Result<Notification> {
        self.records.lock().unwrap().push(RecordedNotification {
            user_id,
            birthday_id,
            channel,
            status,
        });
        Ok(Notification {
            id: Uuid::new_v4(),
            user_id,
            birthday_id,
            channel,
            status,
            sent_at: OffsetDateTime::now_utc(),
        })
    }
}
