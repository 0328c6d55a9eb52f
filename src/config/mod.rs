use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::str::FromStr;
use time::macros::format_description;
use time::Time;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub app_mode: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub paseto_access_key: [u8; 32],
    /// Wall-clock time the daily reminder run fires, process-local zone.
    pub reminder_fire_time: Time,
    pub push_endpoint: String,
    pub push_api_key: String,
    pub email_endpoint: String,
    pub email_api_key: String,
    pub email_fallback_endpoint: Option<String>,
    pub email_fallback_api_key: Option<String>,
    pub email_from: String,
    pub delivery_timeout_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;
        let app_mode = env_or("APP_MODE", "api");

        Ok(Self {
            http_addr,
            app_mode,
            database_url: env_or_err("DATABASE_URL")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "25")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            paseto_access_key: env_key_32("PASETO_ACCESS_KEY")?,
            reminder_fire_time: env_fire_time("REMINDER_FIRE_TIME", "00:00:00")?,
            push_endpoint: env_or_err("PUSH_ENDPOINT")?,
            push_api_key: env_or_err("PUSH_API_KEY")?,
            email_endpoint: env_or_err("EMAIL_ENDPOINT")?,
            email_api_key: env_or_err("EMAIL_API_KEY")?,
            email_fallback_endpoint: std::env::var("EMAIL_FALLBACK_ENDPOINT").ok(),
            email_fallback_api_key: std::env::var("EMAIL_FALLBACK_API_KEY").ok(),
            email_from: env_or("EMAIL_FROM", "Birthday Reminder <no-reply@localhost>"),
            delivery_timeout_seconds: env_or_parse("DELIVERY_TIMEOUT_SECONDS", "10")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_fire_time(key: &str, default: &str) -> Result<Time> {
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    let format = format_description!("[hour]:[minute]:[second]");
    Time::parse(&value, &format)
        .map_err(|err| anyhow!("invalid {} (expected HH:MM:SS): {}", key, err))
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    let decoded = STANDARD
        .decode(value.as_bytes())
        .map_err(|err| anyhow!("invalid {}: {}", key, err))?;
    if decoded.len() != 32 {
        return Err(anyhow!("invalid {}: expected 32 bytes", key));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
