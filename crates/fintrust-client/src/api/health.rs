//! Health API.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::types::HealthResponse;

/// Health API client.
///
/// Used as a liveness probe for the backend and the current session.
pub struct HealthApi {
    client: GatewayClient,
}

impl HealthApi {
    pub(crate) fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Check basic health.
    pub async fn check(&self) -> Result<HealthResponse> {
        self.client.get("/health").await
    }

    /// Simple connectivity check - returns true if the backend reports healthy.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.map(|h| h.is_healthy()).unwrap_or(false)
    }
}
