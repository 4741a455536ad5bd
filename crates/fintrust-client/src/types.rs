//! Request and response types for the FinTrust backend.
//!
//! These types mirror the backend's API contract.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

/// A single account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: String,
    pub account_type: String,
    pub balance: f64,
    pub created_at: String,
}

/// Response from `GET /api/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub total_accounts: usize,
    pub total_balance: f64,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

/// A single transaction. Debits are negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub merchant: Option<String>,
    pub timestamp: String,
}

/// Response from `GET /api/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionList {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loan evaluation
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /api/loan/evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanEvaluationRequest {
    /// Base64 ciphertext of the applicant's financial data.
    pub encrypted_payload: String,
}

/// Response from `POST /api/loan/evaluate`.
///
/// The evaluator answers either with a result or with an `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanEvaluationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_loan_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Audit
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the audit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: String,
    pub details: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

/// Response from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
