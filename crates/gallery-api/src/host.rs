//! Client for the hosted image store.
//!
//! Handlers only see the [`ImageHost`] trait; [`Cloudinary`] is the
//! production implementation speaking the signed upload/destroy API.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

/// An image accepted from a client, ready to be forwarded to the host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: String,
}

/// Where the host put an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    /// Opaque id the host needs to delete the object later.
    pub storage_ref: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage>;

    /// Removes a hosted object. Deleting an object that is already gone succeeds.
    async fn destroy(&self, storage_ref: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
}

pub struct Cloudinary {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Debug, Deserialize)]
struct HostErrorBody {
    error: HostErrorDetail,
}

#[derive(Debug, Deserialize)]
struct HostErrorDetail {
    message: String,
}

impl Cloudinary {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gallery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("image host {} request failed", action))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<HostErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            bail!("image host {} returned {}: {}", action, status, message);
        }

        Ok(resp)
    }
}

#[async_trait]
impl ImageHost for Cloudinary {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", &self.config.folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let size = image.bytes.len();
        let part = Part::stream(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature);

        let result: UploadResult = self
            .send("upload", form)
            .await?
            .json()
            .await
            .context("image host upload response was not understood")?;

        info!("Uploaded {} bytes to image host as {}", size, result.public_id);
        Ok(StoredImage {
            url: result.secure_url,
            storage_ref: result.public_id,
        })
    }

    async fn destroy(&self, storage_ref: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", storage_ref), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = Form::new()
            .text("public_id", storage_ref.to_string())
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let result: DestroyResult = self
            .send("destroy", form)
            .await?
            .json()
            .await
            .context("image host destroy response was not understood")?;

        match result.result.as_str() {
            "ok" => {
                debug!("Destroyed hosted image {}", storage_ref);
                Ok(())
            }
            "not found" => {
                warn!("Hosted image {} already gone", storage_ref);
                Ok(())
            }
            other => Err(anyhow!("image host refused to destroy {}: {}", storage_ref, other)),
        }
    }
}

/// Request signature: hex SHA-1 of `k1=v1&k2=v2...` (keys sorted) followed
/// by the API secret.
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
