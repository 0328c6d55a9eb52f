pub mod auth;
pub mod birthdays;
pub mod notifications;
pub mod reminders;
pub mod users;
