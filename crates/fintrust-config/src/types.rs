//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [identity]
//! keycloak_url = "http://localhost:8080"
//! realm = "fintrust"
//! client_id = "frontend-client"
//! redirect_uri = "http://localhost:3000/login"
//!
//! [backend]
//! base_url = "http://localhost:18000"
//! audit_url = "http://localhost:8000/api/audit"
//! timeout_secs = 30
//!
//! [policy]
//! threshold = 50000.0
//! sensitivity = 1000.0
//! epsilon = 1.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default Keycloak base URL.
pub const DEFAULT_KEYCLOAK_URL: &str = "http://localhost:8080";
/// Default Keycloak realm.
pub const DEFAULT_REALM: &str = "fintrust";
/// Default OAuth client id.
pub const DEFAULT_CLIENT_ID: &str = "frontend-client";
/// Default redirect URI registered with the identity provider.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/login";
/// Default backend base URL.
pub const DEFAULT_API_BASE: &str = "http://localhost:18000";
/// Default audit endpoint.
pub const DEFAULT_AUDIT_URL: &str = "http://localhost:8000/api/audit";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default eligibility threshold; a final score must be strictly above it.
pub const DEFAULT_THRESHOLD: f64 = 50_000.0;
/// Default noise sensitivity.
pub const DEFAULT_SENSITIVITY: f64 = 1_000.0;
/// Default privacy budget.
pub const DEFAULT_EPSILON: f64 = 1.0;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Every section falls back to its defaults, so a partial file only
/// overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FintrustConfig {
    pub identity: IdentityConfig,
    pub backend: BackendConfig,
    pub policy: PolicyConfig,
    pub crypto: CryptoConfig,
}

impl FintrustConfig {
    /// Create a config with local-development defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Check values that would break the decision pipeline.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Identity provider (Keycloak) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub keycloak_url: String,
    pub realm: String,
    pub client_id: String,
    pub redirect_uri: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keycloak_url: DEFAULT_KEYCLOAK_URL.to_string(),
            realm: DEFAULT_REALM.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
        }
    }
}

impl IdentityConfig {
    fn realm_base(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.keycloak_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// The provider's authorization endpoint.
    pub fn authorize_url(&self) -> String {
        format!("{}/auth", self.realm_base())
    }

    /// The provider's token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/token", self.realm_base())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Backend gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Absolute URL of the audit endpoint; may live on a different host.
    pub audit_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            audit_url: DEFAULT_AUDIT_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Loan decision policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub threshold: f64,
    pub sensitivity: f64,
    pub epsilon: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sensitivity: DEFAULT_SENSITIVITY,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(invalid("policy.threshold", "must be finite"));
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(invalid("policy.sensitivity", "must be finite and >= 0"));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(invalid("policy.epsilon", "must be finite and > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Crypto
// ─────────────────────────────────────────────────────────────────────────────

/// Key material shared with the remote evaluator.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Base64-encoded 256-bit key. When absent an ephemeral key is generated.
    pub evaluation_key: Option<String>,
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field(
                "evaluation_key",
                &self.evaluation_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_development() {
        let config = FintrustConfig::new();
        assert_eq!(config.identity.keycloak_url, "http://localhost:8080");
        assert_eq!(config.identity.realm, "fintrust");
        assert_eq!(config.identity.client_id, "frontend-client");
        assert_eq!(config.backend.base_url, "http://localhost:18000");
        assert_eq!(config.backend.audit_url, "http://localhost:8000/api/audit");
        assert_eq!(config.policy.threshold, 50_000.0);
        assert_eq!(config.policy.sensitivity, 1_000.0);
        assert_eq!(config.policy.epsilon, 1.0);
        assert!(config.crypto.evaluation_key.is_none());
    }

    #[test]
    fn test_endpoint_urls() {
        let identity = IdentityConfig {
            keycloak_url: "https://sso.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            identity.token_url(),
            "https://sso.example.com/realms/fintrust/protocol/openid-connect/token"
        );
        assert_eq!(
            identity.authorize_url(),
            "https://sso.example.com/realms/fintrust/protocol/openid-connect/auth"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FintrustConfig::from_toml(
            r#"
[identity]
realm = "staging"

[policy]
threshold = 42000.0
"#,
        )
        .unwrap();

        assert_eq!(config.identity.realm, "staging");
        assert_eq!(config.identity.client_id, "frontend-client");
        assert_eq!(config.policy.threshold, 42_000.0);
        assert_eq!(config.policy.epsilon, 1.0);
    }

    #[test]
    fn test_policy_validation() {
        assert!(PolicyConfig::default().validate().is_ok());

        let zero_epsilon = PolicyConfig {
            epsilon: 0.0,
            ..Default::default()
        };
        assert!(zero_epsilon.validate().is_err());

        let negative_sensitivity = PolicyConfig {
            sensitivity: -1.0,
            ..Default::default()
        };
        assert!(negative_sensitivity.validate().is_err());

        let nan_threshold = PolicyConfig {
            threshold: f64::NAN,
            ..Default::default()
        };
        assert!(nan_threshold.validate().is_err());
    }

    #[test]
    fn test_crypto_debug_redacts_key() {
        let crypto = CryptoConfig {
            evaluation_key: Some("c2VjcmV0".to_string()),
        };
        let rendered = format!("{:?}", crypto);
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(rendered.contains("redacted"));
    }
}
