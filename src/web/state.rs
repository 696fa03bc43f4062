use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{api::ApiClient, cdn::CdnClient, config::Config, web::session};

/// Shared per-process state: configuration plus the two outbound clients.
/// Everything here is cheaply cloneable; requests share no mutable state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    api: ApiClient,
    cdn: CdnClient,
    key: Key,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let config = Config::from_env().context("failed to load configuration")?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        let api = ApiClient::new(config.api_url.clone());
        let cdn = CdnClient::new(config.cloudinary.clone());
        let key = session::signing_key(&config.session_secret);

        Self {
            config: Arc::new(config),
            api,
            cdn,
            key,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cdn(&self) -> &CdnClient {
        &self.cdn
    }

    pub fn production(&self) -> bool {
        self.config.production
    }
}

// Lets SignedCookieJar extract its verification key from the app state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}
