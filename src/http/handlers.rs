use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::app::birthdays::{BirthdayInput, BirthdayService};
use crate::app::notifications::{
    NotificationHistoryItem, NotificationRecorder, NotificationService,
};
use crate::app::users::UserService;
use crate::domain::birthday::Birthday;
use crate::domain::notification::{Channel, DeliveryStatus, Notification};
use crate::domain::user::User;
use crate::http::{AppError, AuthUser};
use crate::infra::email::EmailSender as _;
use crate::infra::push::PushSender as _;
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_profile(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to fetch profile");
        AppError::internal("failed to fetch profile")
    })?;

    user.map(Json).ok_or_else(|| AppError::not_found("user not found"))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// `HH:MM:SS`
    pub reminder_time: Option<String>,
    /// Omitted = unchanged, null = clear, string = register.
    #[serde(default)]
    pub push_token: Option<Option<String>>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(AppError::bad_request("invalid email address"));
        }
    }

    let reminder_time = payload
        .reminder_time
        .as_deref()
        .map(parse_reminder_time)
        .transpose()?;

    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(
            auth.user_id,
            payload.first_name,
            payload.last_name,
            payload.email,
            reminder_time,
            payload.push_token,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    user.map(Json).ok_or_else(|| AppError::not_found("user not found"))
}

fn parse_reminder_time(value: &str) -> Result<Time, AppError> {
    let format = format_description!("[hour]:[minute]:[second]");
    Time::parse(value, &format)
        .map_err(|_| AppError::bad_request("reminder_time must be HH:MM:SS"))
}

// ---------------------------------------------------------------------------
// Birthdays
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BirthdayResponse {
    #[serde(flatten)]
    pub birthday: Birthday,
    pub days_until: i64,
    pub age: i32,
}

impl BirthdayResponse {
    fn new(birthday: Birthday, today: Date) -> Self {
        let days_until = birthday.days_until(today);
        let age = birthday.age_at_next_occurrence(today);
        Self {
            birthday,
            days_until,
            age,
        }
    }
}

#[derive(Serialize)]
pub struct BirthdayListResponse {
    pub birthdays: Vec<BirthdayResponse>,
}

pub async fn list_birthdays(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BirthdayListResponse>, AppError> {
    let service = BirthdayService::new(state.db.clone());
    let birthdays = service.list(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list birthdays");
        AppError::internal("failed to fetch birthdays")
    })?;

    let today = today_local();
    Ok(Json(BirthdayListResponse {
        birthdays: birthdays
            .into_iter()
            .map(|birthday| BirthdayResponse::new(birthday, today))
            .collect(),
    }))
}

#[derive(Deserialize)]
pub struct BirthdayRequest {
    pub name: String,
    pub birthday: Date,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub reminder_days: Option<i32>,
    pub notes: Option<String>,
}

impl BirthdayRequest {
    fn into_input(self) -> Result<BirthdayInput, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("name is required"));
        }
        let reminder_days = self.reminder_days.unwrap_or(1);
        if reminder_days < 0 {
            return Err(AppError::bad_request("reminder_days must be non-negative"));
        }
        if let Some(email) = &self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(AppError::bad_request("invalid email address"));
            }
        }
        Ok(BirthdayInput {
            name: self.name,
            birthday: self.birthday,
            email: self.email.filter(|email| !email.is_empty()),
            phone: self.phone.filter(|phone| !phone.is_empty()),
            reminder_days,
            notes: self.notes.filter(|notes| !notes.is_empty()),
        })
    }
}

pub async fn create_birthday(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BirthdayRequest>,
) -> Result<(StatusCode, Json<BirthdayResponse>), AppError> {
    let input = payload.into_input()?;
    let service = BirthdayService::new(state.db.clone());
    let birthday = service.create(auth.user_id, input).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to create birthday");
        AppError::internal("failed to create birthday")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(BirthdayResponse::new(birthday, today_local())),
    ))
}

pub async fn update_birthday(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BirthdayRequest>,
) -> Result<Json<BirthdayResponse>, AppError> {
    let input = payload.into_input()?;
    let service = BirthdayService::new(state.db.clone());
    let birthday = service
        .update(id, auth.user_id, input)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to update birthday");
            AppError::internal("failed to update birthday")
        })?
        .ok_or_else(|| AppError::not_found("birthday not found"))?;

    Ok(Json(BirthdayResponse::new(birthday, today_local())))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn delete_birthday(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let service = BirthdayService::new(state.db.clone());
    let deleted = service
        .soft_delete(id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to delete birthday");
            AppError::internal("failed to delete birthday")
        })?;

    if !deleted {
        return Err(AppError::not_found("birthday not found"));
    }
    Ok(Json(MessageResponse {
        message: "birthday deleted",
    }))
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SendNotificationRequest {
    pub birthday_id: Uuid,
    pub channel: Channel,
    pub title: String,
    pub body: String,
}

#[derive(Serialize)]
pub struct SendNotificationResponse {
    pub notification: Notification,
}

/// Manual trigger path: same delivery capabilities and recorder as the daily
/// run, for a single owner-chosen birthday.
pub async fn send_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<SendNotificationResponse>), AppError> {
    if payload.title.trim().is_empty() || payload.body.trim().is_empty() {
        return Err(AppError::bad_request("title and body are required"));
    }

    let birthdays = BirthdayService::new(state.db.clone());
    let birthday = birthdays
        .get(payload.birthday_id, auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to load birthday");
            AppError::internal("failed to send notification")
        })?
        .ok_or_else(|| AppError::not_found("birthday not found"))?;

    let users = UserService::new(state.db.clone());
    let user = users
        .get_profile(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to load user");
            AppError::internal("failed to send notification")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let sent = match payload.channel {
        Channel::Push => match &user.push_token {
            Some(token) => {
                let mut data = HashMap::new();
                data.insert("birthdayId".to_string(), birthday.id.to_string());
                state
                    .push
                    .send(token, &payload.title, &payload.body, &data)
                    .await
                    .is_ok()
            }
            None => false,
        },
        Channel::Email => state
            .email
            .send(&user.email, &payload.title, &payload.body)
            .await
            .is_ok(),
    };

    let recorder = NotificationService::new(state.db.clone());
    let notification = recorder
        .record(
            auth.user_id,
            birthday.id,
            payload.channel,
            DeliveryStatus::from_outcome(sent),
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to record notification");
            AppError::internal("failed to record notification")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SendNotificationResponse { notification }),
    ))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub notifications: Vec<NotificationHistoryItem>,
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let service = NotificationService::new(state.db.clone());
    let (notifications, total_count) =
        service.list(auth.user_id, page, limit).await.map_err(|err| {
            tracing::error!(error = ?err, "failed to list notifications");
            AppError::internal("failed to fetch notifications")
        })?;

    Ok(Json(HistoryResponse {
        notifications,
        total_count,
        current_page: page,
        total_pages: (total_count + limit - 1) / limit,
    }))
}

fn today_local() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}
