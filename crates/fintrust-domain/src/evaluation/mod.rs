//! Private loan evaluation.
//!
//! The applicant's figures are encrypted locally, scored remotely on
//! ciphertext, and the returned score is decrypted and perturbed with
//! differential-privacy noise before the local threshold decision.
//!
//! - [`cipher`]: payload encryption
//! - [`privacy`]: noise and the decision policy
//! - [`pipeline`]: the run state machine

pub mod cipher;
pub mod pipeline;
pub mod privacy;

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

pub use cipher::{AeadCipher, CipherError, EncryptedPayload, PayloadCipher};
pub use pipeline::EvaluationPipeline;
pub use privacy::{FixedNoise, NoiseSource, PrivacyPolicy, UniformNoise};

/// Accepted credit bureau scores.
pub const CREDIT_SCORE_RANGE: RangeInclusive<u32> = 300..=850;

/// The applicant's figures. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub income: f64,
    pub credit_score: u32,
}

impl EvaluationRequest {
    pub fn new(income: f64, credit_score: u32) -> Self {
        Self {
            income,
            credit_score,
        }
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if !self.income.is_finite() || self.income <= 0.0 {
            return Err(EvalError::InvalidInput(format!(
                "income must be a positive amount, got {}",
                self.income
            )));
        }
        if !CREDIT_SCORE_RANGE.contains(&self.credit_score) {
            return Err(EvalError::InvalidInput(format!(
                "credit score must be between {} and {}, got {}",
                CREDIT_SCORE_RANGE.start(),
                CREDIT_SCORE_RANGE.end(),
                self.credit_score
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Eligible,
    Denied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Eligible => f.write_str("Eligible"),
            Outcome::Denied => f.write_str("Denied"),
        }
    }
}

/// A local loan decision. Never transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub final_score: f64,
    pub outcome: Outcome,
    /// Sequence number of the run that produced it.
    pub sequence: u64,
}

/// Where an evaluation run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationState {
    #[default]
    Idle,
    Encrypting,
    AwaitingResult,
    Decrypting,
    Decided,
    Failed,
}

impl EvaluationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Decided | Self::Failed)
    }
}

impl fmt::Display for EvaluationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Encrypting => "encrypting",
            Self::AwaitingResult => "awaiting result",
            Self::Decrypting => "decrypting",
            Self::Decided => "decided",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(EvaluationRequest::new(75_000.0, 720).validate().is_ok());
        assert!(EvaluationRequest::new(1.0, 300).validate().is_ok());
        assert!(EvaluationRequest::new(1.0, 850).validate().is_ok());

        for bad in [
            EvaluationRequest::new(0.0, 700),
            EvaluationRequest::new(-10.0, 700),
            EvaluationRequest::new(f64::NAN, 700),
            EvaluationRequest::new(50_000.0, 299),
            EvaluationRequest::new(50_000.0, 851),
        ] {
            assert!(matches!(bad.validate(), Err(EvalError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Eligible.to_string(), "Eligible");
        assert_eq!(Outcome::Denied.to_string(), "Denied");
    }
}
