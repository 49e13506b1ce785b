//! HTTP client for the image hosting endpoint.
//!
//! Chat images go up as a multipart form (`file`, `upload_preset`); profile
//! photos as a JSON body carrying a base64 data URI.  Both answer with JSON
//! holding `secure_url`.  Nothing is retried.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use livetalk_shared::constants::DEFAULT_IMAGE_MIME;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct DataUriUpload<'a> {
    file: String,
    upload_preset: &'a str,
    cloud_name: &'a str,
}

/// Uploads images and returns their public URL.
#[derive(Debug, Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    endpoint: Option<String>,
    upload_preset: String,
    cloud_name: String,
}

impl ImageUploader {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.upload_endpoint(),
            upload_preset: config.upload_preset.clone(),
            cloud_name: config.cloud_name.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Upload a picked chat image as `chat_{uuid}.jpg`.
    pub async fn upload_chat_image(
        &self,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Result<String, ClientError> {
        let endpoint = self.endpoint()?;
        let file_name = format!("chat_{}.jpg", Uuid::new_v4());
        let size = bytes.len();

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime.unwrap_or(DEFAULT_IMAGE_MIME))?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        debug!(file = %file_name, size, "uploading chat image");

        let response = self.client.post(endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "image upload rejected");
            return Err(ClientError::Upload(body));
        }

        let url = secure_url(response.json().await?)?;
        info!(url = %url, "chat image uploaded");
        Ok(url)
    }

    /// Upload a profile photo as a JPEG data URI.
    pub async fn upload_profile_photo(&self, bytes: &[u8]) -> Result<String, ClientError> {
        let endpoint = self.endpoint()?;
        let body = DataUriUpload {
            file: format!("data:{};base64,{}", DEFAULT_IMAGE_MIME, BASE64.encode(bytes)),
            upload_preset: &self.upload_preset,
            cloud_name: &self.cloud_name,
        };

        let response = self.client.post(endpoint).json(&body).send().await?;
        let status = response.status();

        // This endpoint reports failures in the JSON body as well.
        let parsed: UploadResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) if !status.is_success() => {
                return Err(ClientError::Upload(format!("HTTP {status}: {e}")));
            }
            Err(e) => return Err(e.into()),
        };

        let url = secure_url(parsed)?;
        info!(url = %url, "profile photo uploaded");
        Ok(url)
    }

    fn endpoint(&self) -> Result<&str, ClientError> {
        self.endpoint
            .as_deref()
            .ok_or(ClientError::UploadNotConfigured)
    }
}

fn secure_url(response: UploadResponse) -> Result<String, ClientError> {
    match response.secure_url {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(ClientError::Upload(
            response
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string()),
        )),
    }
}
