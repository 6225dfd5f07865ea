//! Token lifecycle — durable storage of the access/refresh token pair.
//!
//! `TokenStore` is the storage seam; `FileTokenStore` keeps the pair in a JSON
//! file between runs, `MemoryTokenStore` keeps it in-process.
//! `TokenManager` carries the restore/persist/clear protocol the session relies on.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::{AccessToken, TokenPair};

/// Contents of durable token storage. Each key may be missing independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl From<&TokenPair> for StoredTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        }
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<StoredTokens, AppError>;
    async fn save(&self, tokens: &StoredTokens) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// FileTokenStore
// ────────────────────────────────────────────────────────────────────────────

/// Stores the token pair as `{"accessToken": .., "refreshToken": ..}` in a JSON file.
///
/// A missing file means no stored tokens. Writes go through a sibling temp file
/// and a rename so a crash never leaves a half-written token file behind.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<StoredTokens, AppError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token file at {}", self.path.display());
                return Ok(StoredTokens::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            AppError::Storage(format!(
                "token file {} is not valid JSON: {e}",
                self.path.display()
            ))
        })
    }

    async fn save(&self, tokens: &StoredTokens) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryTokenStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(pair: &TokenPair) -> Self {
        Self {
            tokens: Mutex::new(StoredTokens::from(pair)),
        }
    }

    pub async fn snapshot(&self) -> StoredTokens {
        self.tokens.lock().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<StoredTokens, AppError> {
        Ok(self.tokens.lock().await.clone())
    }

    async fn save(&self, tokens: &StoredTokens) -> Result<(), AppError> {
        *self.tokens.lock().await = tokens.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        *self.tokens.lock().await = StoredTokens::default();
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TokenManager
// ────────────────────────────────────────────────────────────────────────────

/// Restore / persist / clear protocol over a `TokenStore`.
///
/// The refresh token is written and cleared alongside the access token but never
/// exchanged; no renewal endpoint exists on the API.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Reads the stored access token, if any.
    pub async fn restore(&self) -> Result<Option<AccessToken>, AppError> {
        let stored = self.store.load().await?;
        match stored.access_token {
            Some(token) if !token.is_empty() => {
                info!("Restored access token from storage");
                Ok(Some(AccessToken::new(token)))
            }
            _ => Ok(None),
        }
    }

    pub async fn persist(&self, pair: &TokenPair) -> Result<(), AppError> {
        self.store.save(&StoredTokens::from(pair)).await?;
        debug!("Persisted token pair");
        Ok(())
    }

    /// Removes both tokens. Never fails: a storage error is logged and swallowed
    /// so that logout always completes.
    pub async fn clear(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear stored tokens: {e}");
        }
    }
}
