use std::env;

use anyhow::{Context, Result, ensure};

/// Process-wide configuration, loaded once at start.
///
/// `SESSION_SECRET` and `API_URL` are hard requirements: without a signing
/// secret every session cookie would be forgeable, and without the upstream
/// API there is nothing to serve. Missing CDN credentials only fail the
/// avatar-upload path, so they stay optional here.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub session_secret: String,
    pub cloudinary: CloudinaryConfig,
    pub production: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("API_URL").context("API_URL env var is missing")?;
        let session_secret =
            env::var("SESSION_SECRET").context("SESSION_SECRET must be set in environment")?;
        ensure!(
            !session_secret.trim().is_empty(),
            "SESSION_SECRET must not be empty"
        );

        let cloudinary = CloudinaryConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            api_key: env::var("CLOUDINARY_API_KEY").ok(),
            api_secret: env::var("CLOUDINARY_API_SECRET").ok(),
            folder: env::var("CLOUDINARY_IMG_FOLDER").ok(),
        };

        let production = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            session_secret,
            cloudinary,
            production,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloudinary_config_defaults_to_unconfigured() {
        let cfg = CloudinaryConfig::default();
        assert!(cfg.cloud_name.is_none());
        assert!(cfg.api_secret.is_none());
    }
}
