use super::build_message;
use crate::domain::identity::SenderIdentity;
use crate::domain::template::RenderedMessage;
use crate::services::mailer::{DeliveryError, MailDispatcher};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sends each message as a raw MIME document through the Gmail REST API,
/// authenticated with the caller's own access token.
#[derive(Debug, Clone)]
pub struct GmailApiDispatcher {
    client: reqwest::Client,
    send_url: String,
}

#[derive(Debug, Serialize)]
struct GmailSendRequest {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct GmailSendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

impl GmailApiDispatcher {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(send_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, send_url: send_url.into() })
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<GoogleErrorBody>(body).map_or_else(|_| body.trim().to_string(), |parsed| parsed.error.message)
}

#[async_trait]
impl MailDispatcher for GmailApiDispatcher {
    #[tracing::instrument(err(level = "debug"), skip_all, fields(recipient = %recipient))]
    async fn dispatch(
        &self,
        credential: &str,
        sender: &SenderIdentity,
        recipient: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError> {
        let mime = build_message(sender, recipient, message)?;
        let request = GmailSendRequest { raw: base64::engine::general_purpose::URL_SAFE.encode(mime.formatted()) };

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await
            .map_err(DeliveryError::new)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::new(format!("Gmail API returned {status}: {}", api_error_message(&body))));
        }

        match response.json::<GmailSendResponse>().await {
            Ok(sent) => tracing::debug!(message_id = %sent.id, "Message accepted"),
            Err(e) => tracing::debug!(error = %e, "Message accepted with unreadable response body"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gmail-api"
    }
}
