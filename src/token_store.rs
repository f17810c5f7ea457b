// src/token_store.rs - Access/refresh token persistence
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::error::ApiResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Last email used with "remember me".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remembered_email: Option<String>,
}

/// Where bearer tokens live between requests. The browser build keeps them in
/// cookies only; native builds and the CLI hand them to a store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> Option<String>;
    async fn refresh_token(&self) -> Option<String>;
    async fn set_tokens(&self, access: Option<String>, refresh: Option<String>) -> ApiResult<()>;
    async fn clear(&self) -> ApiResult<()>;
}

// ==================== MEMORY ====================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(StoredTokens {
                access_token: Some(access.to_string()),
                refresh_token: Some(refresh.to_string()),
                remembered_email: None,
            }),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).access_token.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).refresh_token.clone()
    }

    async fn set_tokens(&self, access: Option<String>, refresh: Option<String>) -> ApiResult<()> {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if access.is_some() {
            tokens.access_token = access;
        }
        if refresh.is_some() {
            tokens.refresh_token = refresh;
        }
        Ok(())
    }

    async fn clear(&self) -> ApiResult<()> {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.access_token = None;
        tokens.refresh_token = None;
        Ok(())
    }
}

// ==================== FILE ====================

/// JSON file store used by the CLI. The file is read lazily once and then
/// cached; every change is written back immediately.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: Mutex<Option<StoredTokens>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> StoredTokens {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                StoredTokens::default()
            }),
            Err(_) => StoredTokens::default(),
        }
    }

    async fn write_file(&self, tokens: &StoredTokens) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(tokens)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn load(&self) -> StoredTokens {
        let mut cache = self.cache.lock().await;
        if let Some(tokens) = cache.as_ref() {
            return tokens.clone();
        }
        let tokens = self.read_file().await;
        *cache = Some(tokens.clone());
        tokens
    }

    async fn update<F>(&self, change: F) -> ApiResult<()>
    where
        F: FnOnce(&mut StoredTokens) + Send,
    {
        let mut cache = self.cache.lock().await;
        let mut tokens = match cache.take() {
            Some(tokens) => tokens,
            None => self.read_file().await,
        };
        change(&mut tokens);
        let result = self.write_file(&tokens).await;
        *cache = Some(tokens);
        result
    }

    pub async fn remembered_email(&self) -> Option<String> {
        self.load().await.remembered_email
    }

    pub async fn set_remembered_email(&self, email: Option<String>) -> ApiResult<()> {
        self.update(|tokens| tokens.remembered_email = email).await
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> Option<String> {
        self.load().await.access_token
    }

    async fn refresh_token(&self) -> Option<String> {
        self.load().await.refresh_token
    }

    async fn set_tokens(&self, access: Option<String>, refresh: Option<String>) -> ApiResult<()> {
        self.update(|tokens| {
            if access.is_some() {
                tokens.access_token = access;
            }
            if refresh.is_some() {
                tokens.refresh_token = refresh;
            }
        })
        .await
    }

    async fn clear(&self) -> ApiResult<()> {
        self.update(|tokens| {
            tokens.access_token = None;
            tokens.refresh_token = None;
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_keeps_existing_refresh_token() {
        let store = MemoryTokenStore::with_tokens("a1", "r1");
        tokio_test::block_on(async {
            store.set_tokens(Some("a2".to_string()), None).await.unwrap();
            assert_eq!(store.access_token().await.as_deref(), Some("a2"));
            assert_eq!(store.refresh_token().await.as_deref(), Some("r1"));

            store.clear().await.unwrap();
            assert_eq!(store.access_token().await, None);
            assert_eq!(store.refresh_token().await, None);
        });
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("tokens.json");

        let store = FileTokenStore::new(&path);
        assert_eq!(store.access_token().await, None);
        store
            .set_tokens(Some("access".to_string()), Some("refresh".to_string()))
            .await
            .unwrap();
        store.set_remembered_email(Some("admin@lab.io".to_string())).await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.access_token().await.as_deref(), Some("access"));
        assert_eq!(reopened.refresh_token().await.as_deref(), Some("refresh"));
        assert_eq!(reopened.remembered_email().await.as_deref(), Some("admin@lab.io"));
    }

    #[tokio::test]
    async fn test_file_store_clear_keeps_remembered_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = FileTokenStore::new(&path);
        store.set_tokens(Some("a".to_string()), Some("r".to_string())).await.unwrap();
        store.set_remembered_email(Some("me@lab.io".to_string())).await.unwrap();
        store.clear().await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.access_token().await, None);
        assert_eq!(reopened.remembered_email().await.as_deref(), Some("me@lab.io"));
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.refresh_token().await, None);
    }
}
