//! Authenticated HTTP gateway to the FinTrust backend.
//!
//! Every request carries the current session's bearer token when one
//! exists. A `401` surfaces as [`GatewayError::Unauthorized`]; the gateway
//! never logs the user out by itself, that decision belongs to the caller.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fintrust_client::{GatewayClient, Result};
//! use fintrust_oauth::{InMemoryCredentialStore, OAuthConfig, TokenManager};
//!
//! # async fn example() -> Result<()> {
//! let tokens = Arc::new(TokenManager::new(
//!     OAuthConfig::default(),
//!     Arc::new(InMemoryCredentialStore::new()),
//! ));
//!
//! let client = GatewayClient::builder()
//!     .base_url("http://localhost:18000")
//!     .token_manager(tokens)
//!     .build()?;
//!
//! if client.health().is_healthy().await {
//!     let summary = client.accounts().list().await?;
//!     println!("{} accounts", summary.total_accounts);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientBuilder, GatewayClient, Method};
pub use error::{GatewayError, Result};
pub use types::*;
