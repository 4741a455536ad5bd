//! Domain facade for FinTrust.
//!
//! Sits between the CLI and the infrastructure crates:
//!
//! - **Consent**: per-session scope grants, confirmed by an audited submit
//! - **Evaluation**: encrypted remote scoring, DP noise, local decision
//! - **Audit**: remote audit trail mirrored to the `audit` tracing target
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fintrust_config::FintrustConfig;
//! use fintrust_domain::{EvaluationRequest, FintrustServices, Scope};
//! use fintrust_oauth::InMemoryCredentialStore;
//!
//! # async fn example() -> fintrust_domain::Result<()> {
//! let services = FintrustServices::new(
//!     &FintrustConfig::new(),
//!     Arc::new(InMemoryCredentialStore::new()),
//! )?;
//!
//! services.login("code-from-redirect").await?;
//! services.grant_consent(&[Scope::Loan]).await?;
//! let decision = services.evaluate(EvaluationRequest::new(75_000.0, 720)).await?;
//! println!("{}", decision.outcome);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod consent;
mod error;
pub mod evaluation;
pub mod services;

#[cfg(test)]
mod test_support;

pub use audit::AuditEmitter;
pub use consent::{ConsentLedger, Scope};
pub use error::{AuditError, ConsentError, DomainError, EvalError, Result};
pub use evaluation::{
    AeadCipher, CipherError, Decision, EncryptedPayload, EvaluationPipeline, EvaluationRequest,
    EvaluationState, FixedNoise, NoiseSource, Outcome, PayloadCipher, PrivacyPolicy, UniformNoise,
};
pub use services::FintrustServices;
