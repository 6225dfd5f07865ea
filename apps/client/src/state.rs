use std::sync::Arc;

use anyhow::Result;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::session::Session;
use crate::tokens::{FileTokenStore, TokenManager, TokenStore};

/// Application shell: owns the one `Session` and hands it out by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<Session>,
}

impl AppState {
    /// Wires config → API client → token storage → session.
    pub fn build(config: Config) -> Result<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_file.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let api = ApiClient::new(&config.api_url, config.http_timeout)?;
        let session = Arc::new(Session::new(api, TokenManager::new(store)));
        Ok(Self { config, session })
    }
}
