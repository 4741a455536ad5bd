//! Domain error types.

use fintrust_client::GatewayError;
use fintrust_oauth::AuthError;
use thiserror::Error;

use crate::consent::Scope;

/// Audit emission errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// No session; nothing was sent.
    #[error("Not authenticated; audit event not sent")]
    Unauthenticated,

    /// The audit endpoint could not be reached or refused the record.
    #[error("Audit endpoint failed: {0}")]
    Transport(#[from] GatewayError),
}

impl AuditError {
    /// No session, or the endpoint rejected the token.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::Transport(e) => e.is_unauthorized(),
        }
    }
}

/// Consent ledger errors.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("Access token missing. Please log in.")]
    NoSession,

    #[error("You must select at least one scope to continue.")]
    NoScopesSelected,

    /// The consent audit record was not accepted, so consent was not given.
    #[error("Failed to submit consent: {0}")]
    AuditFailed(#[from] AuditError),

    #[error("Consent has not been submitted")]
    NotSubmitted,

    #[error("Consent for '{0}' has not been granted")]
    ScopeNotGranted(Scope),

    #[error("Unknown consent scope: {0}")]
    UnknownScope(String),
}

/// Evaluation pipeline errors.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Evaluation request failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The result was missing, not decryptable, or carried no score.
    #[error("Could not decode evaluation result: {0}")]
    Decode(String),

    /// The evaluator answered with an explicit error.
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    #[error("Invalid privacy policy: {0}")]
    Policy(String),

    #[error("Could not encrypt evaluation request: {0}")]
    Cipher(String),

    /// A newer run was issued before this one finished.
    #[error("Evaluation #{sequence} superseded by #{latest}")]
    Superseded { sequence: u64, latest: u64 },
}

/// Errors surfaced by the services facade.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Consent error: {0}")]
    Consent(#[from] ConsentError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    /// Whether the user has to log in (again) before retrying.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Auth(AuthError::NoSession) => true,
            Self::Gateway(e) => e.is_unauthorized(),
            Self::Consent(ConsentError::NoSession) => true,
            Self::Consent(ConsentError::AuditFailed(e)) => e.requires_login(),
            Self::Eval(EvalError::Gateway(e)) => e.is_unauthorized(),
            Self::Audit(e) => e.requires_login(),
            _ => false,
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_audit_token_requires_login() {
        let rejected = || AuditError::Transport(GatewayError::Unauthorized);

        assert!(DomainError::Audit(rejected()).requires_login());
        assert!(DomainError::Consent(ConsentError::AuditFailed(rejected())).requires_login());
        assert!(DomainError::Audit(AuditError::Unauthenticated).requires_login());
    }

    #[test]
    fn test_audit_outage_does_not_require_login() {
        let outage = AuditError::Transport(GatewayError::Api {
            status: 503,
            message: "HTTP 503".to_string(),
        });
        assert!(!DomainError::Consent(ConsentError::AuditFailed(outage)).requires_login());
        assert!(!DomainError::Consent(ConsentError::NoScopesSelected).requires_login());
    }
}
