//! Durable storage for the current session.
//!
//! The store holds exactly two opaque values, `access_token` and
//! `refresh_token`, plus the time they were issued. It survives process
//! restarts and is emptied on logout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{AuthError, Result};

/// Default credentials file name within the fintrust config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

// ============================================================================
// Session
// ============================================================================

/// An authenticated session.
///
/// A session only counts as authenticated while its access token is
/// non-empty; stores never hand out a session without one.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Create a session issued now.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Seconds since the tokens were issued.
    pub fn age_seconds(&self) -> u64 {
        (Utc::now() - self.issued_at).num_seconds().max(0) as u64
    }
}

// Tokens never reach logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &!self.refresh_token.is_empty())
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

// ============================================================================
// CredentialStore Trait
// ============================================================================

/// Persistent key-value cache for the session tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Load the stored session, if an authenticated one exists.
    async fn load(&self) -> Result<Option<Session>>;

    /// Persist a session, replacing any previous one.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Remove stored credentials.
    async fn clear(&self) -> Result<()>;

    /// Check whether credentials are present without loading them.
    fn has_credentials(&self) -> bool;
}

/// Shared credential store for use across async contexts.
pub type SharedCredentialStore = Arc<dyn CredentialStore>;

// ============================================================================
// FileCredentialStore
// ============================================================================

/// File-backed credential store for production use.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    cached: RwLock<Option<Session>>,
}

impl FileCredentialStore {
    /// Create a store keeping its file in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(CREDENTIALS_FILE))
    }

    /// Create with a custom file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Session>> {
        {
            let cache = self.cached.read().await;
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Storage(format!("Failed to read credentials: {}", e)))?;

        let session: Session = serde_json::from_str(&content).map_err(|e| {
            AuthError::Serialization(format!("Failed to parse credentials: {}", e))
        })?;

        if !session.is_authenticated() {
            return Ok(None);
        }

        let mut cache = self.cached.write().await;
        *cache = Some(session.clone());

        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!("Failed to create credentials directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(session).map_err(|e| {
            AuthError::Serialization(format!("Failed to serialize credentials: {}", e))
        })?;

        std::fs::write(&self.path, json)
            .map_err(|e| AuthError::Storage(format!("Failed to write credentials: {}", e)))?;

        let mut cache = self.cached.write().await;
        *cache = Some(session.clone());

        tracing::debug!("Credentials saved to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.cached.write().await;
        *cache = None;

        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| AuthError::Storage(format!("Failed to delete credentials: {}", e)))?;
        }
        Ok(())
    }

    fn has_credentials(&self) -> bool {
        self.path.exists()
    }
}

// ============================================================================
// InMemoryCredentialStore (for testing)
// ============================================================================

/// In-memory credential store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    session: RwLock<Option<Session>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Session>> {
        let session = self.session.read().await;
        Ok(session.clone().filter(Session::is_authenticated))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut slot = self.session.write().await;
        *slot = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut slot = self.session.write().await;
        *slot = None;
        Ok(())
    }

    fn has_credentials(&self) -> bool {
        self.session
            .try_read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_new_is_empty() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());
        assert!(!store.has_credentials());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_save_and_load() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());

        store.save(&Session::new("access", "refresh")).await.unwrap();
        assert!(store.has_credentials());

        // A fresh store reads the file, not the cache.
        let reopened = FileCredentialStore::new(temp.path());
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token, "refresh");
    }

    #[tokio::test]
    async fn test_file_uses_fixed_keys() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());
        store.save(&Session::new("a", "r")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["refresh_token"], "r");
    }

    #[tokio::test]
    async fn test_file_clear() {
        let temp = tempdir().unwrap();
        let store = FileCredentialStore::new(temp.path());

        store.save(&Session::new("a", "r")).await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.has_credentials());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_empty_access_token_is_unauthenticated() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CREDENTIALS_FILE);
        std::fs::write(
            &path,
            r#"{"access_token":"","refresh_token":"r","issued_at":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let store = FileCredentialStore::with_path(path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_corrupt_is_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::with_path(path);
        assert!(matches!(
            store.load().await,
            Err(AuthError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_inmemory_store() {
        let store = InMemoryCredentialStore::new();
        assert!(!store.has_credentials());

        store.save(&Session::new("t", "r")).await.unwrap();
        assert!(store.has_credentials());
        assert_eq!(store.load().await.unwrap().unwrap().access_token, "t");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session = Session::new("secret-access", "secret-refresh");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
