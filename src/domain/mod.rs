pub mod birthday;
pub mod notification;
pub mod user;
