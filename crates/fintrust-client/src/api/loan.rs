//! Loan evaluation API.

use crate::client::GatewayClient;
use crate::error::Result;
use crate::types::{LoanEvaluationRequest, LoanEvaluationResponse};

/// Loan evaluation API client.
///
/// Only ever sees ciphertext; payload encryption and result decryption
/// happen in the caller.
pub struct LoanApi {
    client: GatewayClient,
}

impl LoanApi {
    pub(crate) fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Submit an encrypted payload for remote evaluation.
    pub async fn evaluate(&self, encrypted_payload: &str) -> Result<LoanEvaluationResponse> {
        let request = LoanEvaluationRequest {
            encrypted_payload: encrypted_payload.to_string(),
        };
        self.client.post("/api/loan/evaluate", &request).await
    }
}
