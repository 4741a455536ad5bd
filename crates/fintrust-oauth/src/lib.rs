//! OAuth 2.0 authorization-code flow for the FinTrust client.
//!
//! # Components
//!
//! - [`oauth`]: provider endpoints: authorization URL, code exchange, refresh
//! - [`credential_store`]: durable storage of the current [`Session`]
//! - [`token_manager`]: session lifecycle: login, current session, logout

pub mod credential_store;
pub mod error;
pub mod oauth;
pub mod token_manager;

pub use credential_store::{
    CREDENTIALS_FILE, CredentialStore, FileCredentialStore, InMemoryCredentialStore, Session,
    SharedCredentialStore,
};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, TokenResponse};
pub use token_manager::{SharedTokenManager, TokenManager};
