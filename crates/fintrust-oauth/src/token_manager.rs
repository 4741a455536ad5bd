//! Session lifecycle.
//!
//! The token manager is the only writer of the credential store. Everything
//! else reads the session through [`TokenManager::current_session`].

use std::sync::Arc;

use crate::credential_store::{Session, SharedCredentialStore};
use crate::error::{AuthError, Result};
use crate::oauth::{
    OAuthConfig, build_authorization_url, exchange_code_for_tokens, refresh_access_token,
};

/// Owns the authorization-code exchange and the stored session.
#[derive(Debug)]
pub struct TokenManager {
    config: OAuthConfig,
    store: SharedCredentialStore,
    http: reqwest::Client,
}

/// Shared token manager for use across async contexts.
pub type SharedTokenManager = Arc<TokenManager>;

impl TokenManager {
    pub fn new(config: OAuthConfig, store: SharedCredentialStore) -> Self {
        Self::with_http_client(config, store, reqwest::Client::new())
    }

    /// Create with a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(
        config: OAuthConfig,
        store: SharedCredentialStore,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            store,
            http,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// URL of the provider's login page.
    ///
    /// The caller hands control to the user agent; the provider comes back
    /// to the redirect URI with a `code` for [`complete_authentication`].
    ///
    /// [`complete_authentication`]: Self::complete_authentication
    pub fn begin_authentication(&self) -> String {
        let url = build_authorization_url(&self.config);
        tracing::info!(client_id = %self.config.client_id, "Starting authorization-code flow");
        url
    }

    /// Exchange an authorization code for a session and persist it.
    ///
    /// A code is single-use; callers must not retry with the same one. On
    /// failure the previously stored session, if any, is left untouched.
    pub async fn complete_authentication(&self, code: &str) -> Result<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InvalidRequest(
                "Authorization code is empty".to_string(),
            ));
        }

        let tokens = exchange_code_for_tokens(&self.http, &self.config, code)
            .await
            .inspect_err(|e| tracing::warn!("Token exchange failed: {}", e))?;

        let access_token = tokens.access_token().unwrap_or_default().to_string();
        let session = Session::new(access_token, tokens.refresh_token.unwrap_or_default());
        self.store.save(&session).await?;

        tracing::info!("Authenticated; session stored");
        Ok(session)
    }

    /// Replace the session using the stored refresh token.
    ///
    /// Only runs when the user asks for it; nothing refreshes implicitly.
    pub async fn refresh_session(&self) -> Result<Session> {
        let current = self.store.load().await?.ok_or(AuthError::NoSession)?;
        if current.refresh_token.is_empty() {
            return Err(AuthError::InvalidRequest(
                "Session has no refresh token".to_string(),
            ));
        }

        let tokens = refresh_access_token(&self.http, &self.config, &current.refresh_token).await?;

        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or(current.refresh_token);
        let session = Session::new(tokens.access_token().unwrap_or_default(), refresh_token);
        self.store.save(&session).await?;

        tracing::info!("Session refreshed");
        Ok(session)
    }

    /// The current session, read from the credential store.
    ///
    /// Never touches the network. An unreadable store counts as no session.
    pub async fn current_session(&self) -> Option<Session> {
        match self.store.load().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Credential store unreadable, treating as logged out: {}", e);
                None
            }
        }
    }

    /// Drop the session (logout, or after the backend rejected the token).
    pub async fn invalidate(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("Session invalidated");
        Ok(())
    }
}
