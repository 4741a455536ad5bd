//! Payload encryption between the client and the remote evaluator.
//!
//! AES-256-GCM with a random 96-bit nonce per message. The associated data
//! names the message kind, so a request can never be replayed as a result.
//! Wire form: base64 of `nonce || ciphertext`.

use std::fmt;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EvaluationRequest;

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors from sealing or opening a payload.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: authentication tag mismatch")]
    Decryption,

    #[error("Invalid payload: {0}")]
    InvalidFormat(String),
}

/// What a payload carries. Bound into the AEAD associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Result,
}

impl MessageKind {
    fn associated_data(&self) -> &'static [u8] {
        match self {
            MessageKind::Request => b"fintrust/loan-request/v1",
            MessageKind::Result => b"fintrust/loan-result/v1",
        }
    }
}

/// Opaque ciphertext in wire form.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedPayload(String);

impl EncryptedPayload {
    /// Wrap a payload received over the wire.
    pub fn from_wire(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Contents never reach logs.
impl fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedPayload({} bytes)", self.0.len())
    }
}

/// Symmetric cipher shared with the evaluator.
pub trait PayloadCipher: Send + Sync + fmt::Debug {
    fn seal(&self, kind: MessageKind, plaintext: &[u8]) -> Result<EncryptedPayload, CipherError>;

    fn open(&self, kind: MessageKind, payload: &EncryptedPayload) -> Result<Vec<u8>, CipherError>;
}

/// AES-256-GCM payload cipher.
#[derive(Clone)]
pub struct AeadCipher {
    cipher: Aes256Gcm,
}

impl AeadCipher {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            CipherError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, key.len()))
        })?;
        Ok(Self { cipher })
    }

    /// Build from a base64-encoded 256-bit key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKey(format!("not base64: {}", e)))?;
        Self::new(&key)
    }

    /// A cipher with a fresh random key. Only useful within one process.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }
}

impl fmt::Debug for AeadCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AeadCipher(AES-256-GCM)")
    }
}

impl PayloadCipher for AeadCipher {
    fn seal(&self, kind: MessageKind, plaintext: &[u8]) -> Result<EncryptedPayload, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let payload = Payload {
            msg: plaintext,
            aad: kind.associated_data(),
        };
        let ciphertext = self
            .cipher
            .encrypt(&nonce, payload)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut wire = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        wire.extend_from_slice(&nonce);
        wire.extend_from_slice(&ciphertext);
        Ok(EncryptedPayload(STANDARD.encode(wire)))
    }

    fn open(&self, kind: MessageKind, payload: &EncryptedPayload) -> Result<Vec<u8>, CipherError> {
        let wire = STANDARD
            .decode(payload.as_str())
            .map_err(|e| CipherError::InvalidFormat(format!("not base64: {}", e)))?;
        if wire.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::InvalidFormat(format!(
                "{} bytes is too short",
                wire.len()
            )));
        }

        let (nonce, ciphertext) = wire.split_at(NONCE_LEN);
        let payload = Payload {
            msg: ciphertext,
            aad: kind.associated_data(),
        };
        self.cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .map_err(|_| CipherError::Decryption)
    }
}

#[derive(Serialize, Deserialize)]
struct ScorePlaintext {
    score: f64,
}

/// Encrypt the applicant's figures for the evaluator.
pub fn seal_request(
    cipher: &dyn PayloadCipher,
    request: &EvaluationRequest,
) -> Result<EncryptedPayload, CipherError> {
    let plaintext =
        serde_json::to_vec(request).map_err(|e| CipherError::Encryption(e.to_string()))?;
    cipher.seal(MessageKind::Request, &plaintext)
}

/// Evaluator side of [`seal_request`].
pub fn open_request(
    cipher: &dyn PayloadCipher,
    payload: &EncryptedPayload,
) -> Result<EvaluationRequest, CipherError> {
    let plaintext = cipher.open(MessageKind::Request, payload)?;
    serde_json::from_slice(&plaintext).map_err(|e| CipherError::InvalidFormat(e.to_string()))
}

/// Encrypt a score as the evaluator returns it.
pub fn seal_score(cipher: &dyn PayloadCipher, score: f64) -> Result<EncryptedPayload, CipherError> {
    let plaintext = serde_json::to_vec(&ScorePlaintext { score })
        .map_err(|e| CipherError::Encryption(e.to_string()))?;
    cipher.seal(MessageKind::Result, &plaintext)
}

/// Decrypt an evaluator result into its raw score.
///
/// The plaintext is a JSON object with a numeric `score`; other fields are
/// ignored.
pub fn open_result(cipher: &dyn PayloadCipher, payload: &EncryptedPayload) -> Result<f64, CipherError> {
    let plaintext = cipher.open(MessageKind::Result, payload)?;
    let result: ScorePlaintext = serde_json::from_slice(&plaintext)
        .map_err(|e| CipherError::InvalidFormat(format!("result has no numeric score: {}", e)))?;
    if !result.score.is_finite() {
        return Err(CipherError::InvalidFormat("score is not finite".to_string()));
    }
    Ok(result.score)
}
