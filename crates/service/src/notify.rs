//! Over-assignment alerts.
//!
//! [`over_assignment`] decides whether an alert is due; a [`Notifier`]
//! delivers it. Delivery is a single best-effort attempt with no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::NotifyError;

/// Alert fires once an assignee holds more than this many assets.
pub const DEFAULT_THRESHOLD: usize = 3;

/// Payload accepted by the notification receiver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: String,
    #[serde(rename = "employeeAbbreviation")]
    pub employee: String,
    pub message: String,
}

/// Build the warning for `assignee` if `count` exceeds `threshold`.
pub fn over_assignment(assignee: &str, count: usize, threshold: usize) -> Option<Notification> {
    if assignee.is_empty() || count <= threshold {
        return None;
    }
    Some(Notification {
        level: "Warning".into(),
        employee: assignee.to_string(),
        message: format!("{assignee} is now assigned {count} items"),
    })
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts notifications as JSON and expects `201 Created`.
#[derive(Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(notification).map_err(|e| NotifyError::Encode(e.to_string()))?;
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "error sending notification (is the listener running?)");
                NotifyError::Network(e.to_string())
            })?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            warn!(url = %self.url, %status, "notification not accepted");
            return Err(NotifyError::Status(status.as_u16()));
        }
        debug!(url = %self.url, employee = %notification.employee, "notification delivered");
        Ok(())
    }
}
