use serde::Serialize;
use thiserror::Error;

use crate::domain::pull_request::Color;

pub mod slack;
pub mod stdout;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

/// One chat message: optional free text plus attachment cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Message {
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    async fn send(&self, message: &Message) -> Result<(), SinkError>;
}
