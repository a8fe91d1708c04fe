//! Slack incoming-webhook sink.

use serde::Serialize;
use tracing::{debug, warn};

use super::{Message, NotificationSink, SinkError};

const USERNAME: &str = "Pull Request Reminder";
const ICON_EMOJI: &str = ":bell:";

#[derive(Debug, Serialize)]
pub struct SlackPayload<'a> {
    username: &'static str,
    icon_emoji: &'static str,
    #[serde(flatten)]
    message: &'a Message,
}

pub fn payload(message: &Message) -> SlackPayload<'_> {
    SlackPayload {
        username: USERNAME,
        icon_emoji: ICON_EMOJI,
        message,
    }
}

pub struct SlackWebhook {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl NotificationSink for SlackWebhook {
    async fn send(&self, message: &Message) -> Result<(), SinkError> {
        debug!(
            attachments = message.attachments.len(),
            "posting message to Slack"
        );
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%status, %body, "Slack webhook request failed");
        Err(SinkError::Status { status, body })
    }
}
