//! Client for the WhatsApp push notification API.
//!
//! `NotificationApi` is the seam the scheduler sends through; the HTTP
//! implementation posts one JSON payload per task.

use crate::error::SendError;
use crate::services::dispatch::scheduler::SUCCESS_STATUSES;
use async_trait::async_trait;
use common::model::dispatch::ResolvedTask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const NOTIFICATION_TYPE: &str = "whatsapp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub user_details: UserDetails,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetails {
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: String,
    pub template_id: String,
    pub params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub media_link: String,
}

impl NotificationPayload {
    pub fn for_task(task: &ResolvedTask, sender: &str, template_id: &str) -> Self {
        let media = (!task.image_url.is_empty()).then(|| Media {
            media_link: task.image_url.clone(),
        });
        NotificationPayload {
            user_details: UserDetails {
                number: task.mobile_no.clone(),
            },
            notification: Notification {
                kind: NOTIFICATION_TYPE.to_string(),
                sender: sender.to_string(),
                template_id: template_id.to_string(),
                params: task.params.clone(),
                media,
            },
        }
    }
}

/// What the API answered, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Performs exactly one send attempt.
    async fn push(&self, payload: &NotificationPayload) -> Result<ApiResponse, SendError>;
}

pub struct HttpNotificationApi {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpNotificationApi {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SendError::from)?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn push(&self, payload: &NotificationPayload) -> Result<ApiResponse, SendError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SendError::Timeout(self.timeout)
                } else {
                    SendError::from(e)
                }
            })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(SendError::from)?;

        // An accepted send must come back with a JSON body. Any other status,
        // including other 2xx codes, is classified by the status alone.
        let message = match serde_json::from_slice::<ResponseBody>(&bytes) {
            Ok(body) => body.message.map(|m| match m {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            Err(e) if SUCCESS_STATUSES.contains(&status.as_u16()) => {
                return Err(SendError::MalformedResponse(e.to_string()))
            }
            Err(_) => None,
        };
        Ok(ApiResponse {
            status: status.as_u16(),
            message,
        })
    }
}
