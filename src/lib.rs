pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod jobs;

use std::sync::Arc;

use crate::infra::{db::Db, email::EmailSender, push::PushSender};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub push: Arc<dyn PushSender>,
    pub email: Arc<dyn EmailSender>,
    pub paseto_access_key: [u8; 32],
}
