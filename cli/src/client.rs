use kilo_core::classify::extract_items;
use kilo_core::notification::NotificationId;
use kilo_core::resolution::ConfirmRequest;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::NotifyError;

pub const PENDING_PATH: &str = "/api/reminder/notifications/pending";

pub fn confirm_path(id: NotificationId) -> String {
    format!("/api/reminder/notifications/{id}/confirm")
}

pub fn mark_read_path(id: NotificationId) -> String {
    format!("/api/reminder/notifications/{id}/mark_read")
}

/// Thin client over the three reminder-service endpoints.
#[derive(Clone, Debug)]
pub struct ReminderClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReminderClient {
    pub fn new(config: &ClientConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the raw pending items in arrival order.
    pub async fn fetch_pending(&self) -> Result<Vec<Value>, NotifyError> {
        let resp = self
            .http
            .get(format!("{}{PENDING_PATH}", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Http { status });
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        Ok(extract_items(body)?)
    }

    /// Records a resolution. The response body is ignored.
    pub async fn confirm(
        &self,
        id: NotificationId,
        request: &ConfirmRequest,
    ) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, confirm_path(id)))
            .json(request)
            .send()
            .await?;
        ensure_success(resp.status())
    }

    /// Marks a notification read without recording an outcome.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, mark_read_path(id)))
            .send()
            .await?;
        ensure_success(resp.status())
    }
}

fn ensure_success(status: reqwest::StatusCode) -> Result<(), NotifyError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Http { status })
    }
}
