use std::time::Duration;

use thiserror::Error;

/// Failure of an outbound delivery provider. Callers record the attempt as
/// failed; nothing here propagates past the pair being dispatched.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("no delivery backend configured")]
    NoBackend,
}

/// Outbound HTTP client with the bounded per-request timeout every delivery
/// call must carry.
pub fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, DeliveryError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::Rejected {
        status: status.as_u16(),
        body,
    })
}
