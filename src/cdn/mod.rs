use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use chrono::Utc;
use futures::Stream;
use reqwest::{Body, Client, multipart};
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;

/// Upload relay for the hosted image CDN (Cloudinary).
///
/// Credentials may be absent; the client only complains when an upload is
/// actually attempted, mirroring how optional provider keys are handled
/// elsewhere in the codebase.
#[derive(Clone)]
pub struct CdnClient {
    http: Client,
    config: CloudinaryConfig,
}

impl CdnClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Stream a file part into a CDN upload session and resolve with the
    /// returned secure URL.
    ///
    /// The stream is handed to reqwest as the request body, so bytes flow
    /// through chunk by chunk; the file is never materialized in memory.
    pub async fn upload_stream<S>(
        &self,
        filename: &str,
        content_type: &str,
        stream: S,
    ) -> Result<String>
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        let Some(cloud_name) = self.config.cloud_name.as_ref() else {
            bail!("CLOUDINARY_CLOUD_NAME is not configured but required for uploads");
        };
        let Some(api_key) = self.config.api_key.as_ref() else {
            bail!("CLOUDINARY_API_KEY is not configured but required for uploads");
        };
        let Some(api_secret) = self.config.api_secret.as_ref() else {
            bail!("CLOUDINARY_API_SECRET is not configured but required for uploads");
        };

        let timestamp = Utc::now().timestamp();
        let signature = sign_upload_params(self.config.folder.as_deref(), timestamp, api_secret);

        let part = multipart::Part::stream(Body::wrap_stream(stream))
            .file_name(filename.to_string())
            .mime_str(content_type)
            .context("invalid upload content type")?;

        let mut form = multipart::Form::new()
            .text("api_key", api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature)
            .part("file", part);
        if let Some(folder) = &self.config.folder {
            form = form.text("folder", folder.clone());
        }

        let url = format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("cdn upload request failed")?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .context("failed to parse cdn upload response")?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("upload rejected")
                .to_string();
            bail!("cdn upload failed with status {status}: {message}");
        }

        body["secure_url"]
            .as_str()
            .map(|url| url.to_string())
            .ok_or_else(|| anyhow!("cdn upload response is missing secure_url: {body}"))
    }
}

/// Cloudinary request signature: hex SHA-1 over the alphabetically ordered
/// upload parameters with the API secret appended.
fn sign_upload_params(folder: Option<&str>, timestamp: i64, api_secret: &str) -> String {
    let params = match folder {
        Some(folder) => format!("folder={folder}&timestamp={timestamp}"),
        None => format!("timestamp={timestamp}"),
    };

    let mut hasher = Sha1::new();
    hasher.update(params.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_covers_folder_and_timestamp() {
        let sig = sign_upload_params(Some("avatars"), 1_700_000_000, "secret");
        assert_eq!(sig, "3f540b6272db92f7ada14f90ffa781d24e3ce025");
    }

    #[test]
    fn signature_without_folder_signs_timestamp_only() {
        let sig = sign_upload_params(None, 1_700_000_000, "secret");
        assert_eq!(sig, "84af3c6077e429a8e7ff26d2ca13d5feb6bc7cb0");
    }

    #[test]
    fn signature_changes_with_secret() {
        let a = sign_upload_params(None, 1_700_000_000, "secret");
        let b = sign_upload_params(None, 1_700_000_000, "other");
        assert_ne!(a, b);
    }
}
