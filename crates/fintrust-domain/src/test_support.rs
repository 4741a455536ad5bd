//! Shared fixtures for unit tests.

use std::sync::Arc;

use fintrust_client::GatewayClient;
use fintrust_oauth::{InMemoryCredentialStore, OAuthConfig, Session, TokenManager};
use wiremock::MockServer;

/// A gateway pointed at `server`, with the given session stored.
pub(crate) fn gateway(server: &MockServer, session: Option<Session>) -> GatewayClient {
    let store = match session {
        Some(session) => InMemoryCredentialStore::with_session(session),
        None => InMemoryCredentialStore::new(),
    };
    let tokens = Arc::new(TokenManager::new(OAuthConfig::default(), Arc::new(store)));
    GatewayClient::builder()
        .base_url(server.uri())
        .token_manager(tokens)
        .build()
        .unwrap()
}

pub(crate) fn logged_in(server: &MockServer) -> GatewayClient {
    gateway(server, Some(Session::new("token-123", "refresh-123")))
}
