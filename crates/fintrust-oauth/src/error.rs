//! Error types for the authentication flow.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while acquiring or storing tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Network/HTTP error talking to the identity provider.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but issued no access token.
    #[error("Token exchange rejected: {0}")]
    Rejected(String),

    /// Invalid request (e.g. an empty authorization code).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No session to operate on.
    #[error("Not authenticated")]
    NoSession,

    /// Credential storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Network(e.to_string())
    }
}
