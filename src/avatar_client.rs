/// Avatar upload client
///
/// Talks to a Cloudinary-compatible image upload API. Requests are signed
/// with SHA-256 over the sorted upload parameters plus the API secret.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::configuration::AvatarStorageSettings;
use crate::error::StorageError;

#[derive(Clone)]
pub struct AvatarClient {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl AvatarClient {
    pub fn new(settings: &AvatarStorageSettings) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| StorageError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        })
    }

    /// Upload `image` as the avatar of `user_id` and return its public HTTPS URL.
    /// Re-uploading for the same user overwrites the previous image.
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        image: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name);
        let public_id = format!("avatars/{}", user_id);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let file = Part::bytes(image)
            .file_name("avatar")
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("public_id", public_id)
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach avatar storage");
                StorageError::ServiceUnavailable(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!(error = %e, "Avatar storage returned error");
                StorageError::UploadFailed(e.to_string())
            })?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;

        Ok(body.secure_url)
    }
}

/// Hex SHA-256 of `k1=v1&k2=v2...` (keys sorted) followed by the secret
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
