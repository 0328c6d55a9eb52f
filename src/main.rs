use std::sync::Arc;

use anyhow::anyhow;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use confetti::app::notifications::NotificationService;
use confetti::app::reminders::{PgReminderStore, ReminderService};
use confetti::config::AppConfig;
use confetti::infra::db::Db;
use confetti::infra::delivery::http_client;
use confetti::infra::email::{EmailSender, FailoverEmail, HttpEmail};
use confetti::infra::push::FcmPush;
use confetti::jobs::reminder_scheduler::ReminderScheduler;
use confetti::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = Db::connect(&config).await?;
    let client = http_client(config.delivery_timeout_seconds)
        .map_err(|err| anyhow!("failed to build delivery client: {}", err))?;

    let push = Arc::new(FcmPush::new(
        client.clone(),
        config.push_endpoint.clone(),
        config.push_api_key.clone(),
    ));
    let email = build_email_sender(&config, client);

    let state = AppState {
        db: db.clone(),
        push: push.clone(),
        email: email.clone(),
        paseto_access_key: config.paseto_access_key,
    };

    match config.app_mode.as_str() {
        "api" => {
            let app: Router = http::router(state).layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "worker" => {
            tracing::info!("starting reminder worker");
            let store = Arc::new(PgReminderStore::new(db.clone()));
            let recorder = Arc::new(NotificationService::new(db));
            let service = Arc::new(ReminderService::new(store, push, email, recorder));
            let scheduler = ReminderScheduler::new(service, config.reminder_fire_time);

            tokio::select! {
                _ = scheduler.run() => {}
                _ = shutdown_signal() => {}
            }
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

/// Primary mail backend, wrapped with the fallback provider when one is
/// configured.
fn build_email_sender(config: &AppConfig, client: reqwest::Client) -> Arc<dyn EmailSender> {
    let primary: Arc<dyn EmailSender> = Arc::new(HttpEmail::new(
        client.clone(),
        config.email_endpoint.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
        "primary",
    ));

    match (&config.email_fallback_endpoint, &config.email_fallback_api_key) {
        (Some(endpoint), Some(api_key)) => {
            let fallback: Arc<dyn EmailSender> = Arc::new(HttpEmail::new(
                client,
                endpoint.clone(),
                api_key.clone(),
                config.email_from.clone(),
                "fallback",
            ));
            Arc::new(FailoverEmail::new(vec![primary, fallback]))
        }
        _ => primary,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
