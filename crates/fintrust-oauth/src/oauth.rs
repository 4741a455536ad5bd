//! OAuth 2.0 authorization-code flow against a Keycloak realm.

use fintrust_config::IdentityConfig;
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// OAuth configuration for the identity provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::from(&IdentityConfig::default())
    }
}

impl From<&IdentityConfig> for OAuthConfig {
    fn from(identity: &IdentityConfig) -> Self {
        Self {
            client_id: identity.client_id.clone(),
            authorize_url: identity.authorize_url(),
            token_url: identity.token_url(),
            redirect_uri: identity.redirect_uri.clone(),
            scope: "openid".to_string(),
        }
    }
}

/// Build the authorization URL the user agent is sent to.
pub fn build_authorization_url(config: &OAuthConfig) -> String {
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("scope", config.scope.as_str()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// Token endpoint response.
///
/// Keycloak answers errors with `error`/`error_description` instead of
/// tokens, sometimes with a success status, so every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// The issued access token, if the provider issued a usable one.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    fn rejection_reason(&self, status: reqwest::StatusCode) -> String {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => format!("{}: {}", error, description),
            (Some(error), None) => error.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => format!("no access_token in response (HTTP {})", status.as_u16()),
        }
    }
}

/// Exchange an authorization code for tokens.
///
/// Fails with [`AuthError::Rejected`] when the response carries no access token.
pub async fn exchange_code_for_tokens(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
) -> Result<TokenResponse> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("client_id", config.client_id.as_str()),
    ];

    post_token_form(http, config, &form, "Token exchange").await
}

/// Obtain a new access token with a refresh token.
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &OAuthConfig,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", config.client_id.as_str()),
    ];

    post_token_form(http, config, &form, "Token refresh").await
}

async fn post_token_form(
    http: &reqwest::Client,
    config: &OAuthConfig,
    form: &[(&str, &str)],
    what: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(&config.token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("{} request failed: {}", what, e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::Network(format!("{} response unreadable: {}", what, e)))?;

    let tokens: TokenResponse = if body.trim().is_empty() {
        TokenResponse::default()
    } else {
        serde_json::from_str(&body).map_err(|e| {
            AuthError::Serialization(format!("Failed to parse {} response: {}", what, e))
        })?
    };

    if tokens.access_token().is_none() {
        return Err(AuthError::Rejected(tokens.rejection_reason(status)));
    }

    Ok(tokens)
}
