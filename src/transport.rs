//! src/transport.rs

use crate::domain::{Batch, SubscriberPayload};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Result of one outbound call.
///
/// Sending never fails with an error. Network errors and non-success
/// responses are reported as an unsuccessful outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub body: serde_json::Value,
}

impl Outcome {
    pub fn succeeded(body: serde_json::Value) -> Self {
        Self {
            success: true,
            body,
        }
    }

    pub fn failed(body: serde_json::Value) -> Self {
        Self {
            success: false,
            body,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_batch(&self, batch: &Batch) -> Outcome;

    async fn send_individual(&self, payload: &SubscriberPayload) -> Outcome;
}

#[derive(serde::Serialize)]
struct BatchUpdateRequest<'a> {
    batches: [&'a Batch; 1],
}

/// Client of the third-party profile API.
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
    authorization_token: Option<Secret<String>>,
}

impl HttpTransport {
    pub fn new(
        base_url: String,
        authorization_token: Option<Secret<String>>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build the HTTP client of the third-party API.");
        Self {
            http_client,
            base_url,
            authorization_token,
        }
    }

    async fn post<Body>(&self, path: &str, body: &Body) -> Outcome
    where
        Body: serde::Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = &self.authorization_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return Outcome::failed(serde_json::json!({ "error": e.to_string() }));
            }
        };
        let success = response.status().is_success();
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) if text.is_empty() => serde_json::Value::Null,
            // non JSON bodies are kept as plain string
            Ok(text) => serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)),
            Err(e) => serde_json::json!({ "status": status, "error": e.to_string() }),
        };
        Outcome { success, body }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(name = "Send batch to third-party API", skip_all, fields(batch_size = batch.len()))]
    async fn send_batch(&self, batch: &Batch) -> Outcome {
        self.post("update", &BatchUpdateRequest { batches: [batch] })
            .await
    }

    #[tracing::instrument(
        name = "Send individual update to third-party API",
        skip_all,
        fields(subscriber_email = %payload.email())
    )]
    async fn send_individual(&self, payload: &SubscriberPayload) -> Outcome {
        self.post("update-individual", payload).await
    }
}
