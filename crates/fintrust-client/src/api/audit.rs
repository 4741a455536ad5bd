//! Audit API.

use crate::client::{GatewayClient, Method};
use crate::error::Result;
use crate::types::AuditRecord;

/// Backend audit path, relative to the gateway base URL.
const BACKEND_AUDIT_PATH: &str = "/api/audit";

/// Audit API client.
///
/// Application events (consent, loan results) go to the backend's own audit
/// route. Manual log entries go to the configured audit endpoint, which may
/// live outside the backend base URL.
pub struct AuditApi {
    client: GatewayClient,
}

impl AuditApi {
    pub(crate) fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Record an event on the backend (`POST /api/audit`).
    pub async fn record(&self, record: &AuditRecord) -> Result<serde_json::Value> {
        let body = serde_json::to_value(record)?;
        self.client
            .send(Method::POST, BACKEND_AUDIT_PATH, Some(&body))
            .await
    }

    /// Record an event on the configured audit endpoint.
    pub async fn record_to_log(&self, record: &AuditRecord) -> Result<serde_json::Value> {
        let body = serde_json::to_value(record)?;
        let url = self.client.audit_url().clone();
        self.client.send_to(Method::POST, url, Some(&body)).await
    }
}
