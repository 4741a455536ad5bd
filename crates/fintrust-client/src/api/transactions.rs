//! Transactions API.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::types::TransactionList;

/// Transactions API client.
pub struct TransactionsApi {
    client: GatewayClient,
}

impl TransactionsApi {
    pub(crate) fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// List the user's transactions, newest first.
    pub async fn list(&self) -> Result<TransactionList> {
        self.client.get("/api/transactions").await
    }
}
