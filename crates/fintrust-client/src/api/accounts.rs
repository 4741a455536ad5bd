//! Accounts API.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::types::AccountSummary;

/// Accounts API client.
pub struct AccountsApi {
    client: GatewayClient,
}

impl AccountsApi {
    pub(crate) fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// List the user's accounts with totals.
    pub async fn list(&self) -> Result<AccountSummary> {
        self.client.get("/api/accounts").await
    }
}
