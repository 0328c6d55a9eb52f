use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::infra::delivery::{check_response, DeliveryError};

/// Push delivery capability. The reminder core only sees this trait; the
/// concrete provider is wired up at process start.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), DeliveryError>;
}

/// FCM-style HTTP backend.
pub struct FcmPush {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl FcmPush {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl PushSender for FcmPush {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), DeliveryError> {
        let payload = json!({
            "to": token,
            "notification": {
                "title": title,
                "body": body,
            },
            "data": data,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.api_key))
            .json(&payload)
            .send()
            .await?;
        check_response(response).await?;

        debug!(title, "push notification accepted by provider");
        Ok(())
    }
}
