use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::infra::delivery::{check_response, DeliveryError};

/// Email delivery capability.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError>;
}

/// Mail-API HTTP backend (Resend/SendGrid-shaped JSON POST).
pub struct HttpEmail {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    /// Shown in logs when this backend fails.
    label: &'static str,
}

impl HttpEmail {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        from: String,
        label: &'static str,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            from,
            label,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmail {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        check_response(response).await?;

        debug!(to, provider = self.label, "email accepted by provider");
        Ok(())
    }
}

/// Ordered provider chain: each backend is tried in sequence and the send
/// only counts as failed once the last one has failed.
pub struct FailoverEmail {
    backends: Vec<Arc<dyn EmailSender>>,
}

impl FailoverEmail {
    pub fn new(backends: Vec<Arc<dyn EmailSender>>) -> Self {
        Self { backends }
    }
}

#[async_trait]
impl EmailSender for FailoverEmail {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), DeliveryError> {
        let mut last_error = DeliveryError::NoBackend;
        for (index, backend) in self.backends.iter().enumerate() {
            match backend.send(to, subject, html).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        error = %err,
                        backend = index,
                        "email backend failed, trying next"
                    );
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }
}
