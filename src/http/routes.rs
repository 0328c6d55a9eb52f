use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(handlers::get_profile))
        .route("/users/profile", put(handlers::update_profile))
}

pub fn birthdays() -> Router<AppState> {
    Router::new()
        .route("/birthdays", get(handlers::list_birthdays))
        .route("/birthdays", post(handlers::create_birthday))
        .route("/birthdays/:id", put(handlers::update_birthday))
        .route("/birthdays/:id", delete(handlers::delete_birthday))
}

pub fn notifications() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/send", post(handlers::send_notification))
}
