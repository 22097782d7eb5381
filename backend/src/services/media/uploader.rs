use crate::config::AppConfig;
use crate::error::UploadError;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    display_url: Option<String>,
    url: Option<String>,
    image: Option<UploadImage>,
}

#[derive(Debug, Deserialize)]
struct UploadImage {
    url: Option<String>,
}

impl UploadData {
    fn best_url(self) -> Option<String> {
        self.display_url
            .or(self.url)
            .or(self.image.and_then(|i| i.url))
            .filter(|u| !u.is_empty())
    }
}

/// Client for the image hosting service (imgbb-compatible API).
pub struct MediaUploader {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl MediaUploader {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, UploadError> {
        Self::new(
            config.media_upload_url.clone(),
            config.media_api_key.clone(),
            config.request_timeout,
        )
    }

    /// Uploads one image and returns its displayable URL.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, UploadError> {
        let form = Form::new().part("image", Part::bytes(bytes).file_name(filename.to_string()));
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!("media upload of '{}' rejected with HTTP {}", filename, status);
            return Err(UploadError::Rejected(status));
        }

        let body: UploadResponse = response.json().await?;
        let url = body.data.best_url().ok_or(UploadError::MissingUrl)?;
        info!("media '{}' uploaded to {}", filename, url);
        Ok(url)
    }
}
