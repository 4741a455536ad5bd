//! Domain services.
//!
//! [`FintrustServices`] wires the credential store, token manager, gateway,
//! consent ledger, and evaluation pipeline together. It is the entry point
//! for the CLI.

use std::sync::Arc;
use std::time::Duration;

use fintrust_client::{AccountSummary, GatewayClient, HealthResponse, TransactionList};
use fintrust_config::{CryptoConfig, FintrustConfig};
use fintrust_oauth::{OAuthConfig, Session, SharedCredentialStore, SharedTokenManager, TokenManager};
use tracing::{info, warn};

use crate::audit::{AuditEmitter, MANUAL_AUDIT_LOG};
use crate::consent::{ConsentLedger, Scope};
use crate::error::{DomainError, Result};
use crate::evaluation::{
    AeadCipher, Decision, EvaluationPipeline, EvaluationRequest, NoiseSource, PayloadCipher,
    PrivacyPolicy, UniformNoise,
};

/// Domain services facade.
#[derive(Debug, Clone)]
pub struct FintrustServices {
    tokens: SharedTokenManager,
    gateway: GatewayClient,
    audit: AuditEmitter,
    consent: Arc<ConsentLedger>,
    pipeline: Arc<EvaluationPipeline>,
}

impl FintrustServices {
    /// Build from configuration with a CSPRNG noise source.
    ///
    /// Without a configured evaluation key an ephemeral one is generated,
    /// which no remote evaluator can share.
    pub fn new(config: &FintrustConfig, store: SharedCredentialStore) -> Result<Self> {
        let cipher = cipher_from_config(&config.crypto)?;
        Self::with_parts(config, store, cipher, Arc::new(UniformNoise::new()))
    }

    /// Build with an explicit cipher and noise source.
    pub fn with_parts(
        config: &FintrustConfig,
        store: SharedCredentialStore,
        cipher: Arc<dyn PayloadCipher>,
        noise: Arc<dyn NoiseSource>,
    ) -> Result<Self> {
        info!("Initializing domain services");

        let policy = PrivacyPolicy::try_from(&config.policy)?;

        let http = reqwest_client(config.backend.timeout_secs)?;
        let tokens = Arc::new(TokenManager::with_http_client(
            OAuthConfig::from(&config.identity),
            store,
            http,
        ));

        let gateway = GatewayClient::builder()
            .base_url(&config.backend.base_url)
            .audit_url(&config.backend.audit_url)
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .token_manager(tokens.clone())
            .build()?;

        let audit = AuditEmitter::new(gateway.clone());
        let consent = Arc::new(ConsentLedger::new(tokens.clone(), audit.clone()));
        let pipeline =
            Arc::new(EvaluationPipeline::new(gateway.clone(), cipher, policy).with_noise(noise));

        Ok(Self {
            tokens,
            gateway,
            audit,
            consent,
            pipeline,
        })
    }

    pub fn token_manager(&self) -> &SharedTokenManager {
        &self.tokens
    }

    pub fn gateway(&self) -> &GatewayClient {
        &self.gateway
    }

    pub fn consent(&self) -> &ConsentLedger {
        &self.consent
    }

    pub fn pipeline(&self) -> &EvaluationPipeline {
        &self.pipeline
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// URL to send the user to for login.
    pub fn login_url(&self) -> String {
        self.tokens.begin_authentication()
    }

    /// Exchange an authorization code. A new login starts with no consent.
    pub async fn login(&self, code: &str) -> Result<Session> {
        let session = self.tokens.complete_authentication(code).await?;
        self.consent.clear();
        Ok(session)
    }

    pub async fn refresh(&self) -> Result<Session> {
        Ok(self.tokens.refresh_session().await?)
    }

    /// Drop the session and all consent.
    pub async fn logout(&self) -> Result<()> {
        self.tokens.invalidate().await?;
        self.consent.clear();
        info!("Logged out");
        Ok(())
    }

    pub async fn session(&self) -> Option<Session> {
        self.tokens.current_session().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consent
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant exactly `scopes`, in the order given, and submit them.
    pub async fn grant_consent(&self, scopes: &[Scope]) -> Result<Vec<Scope>> {
        for scope in self.consent.granted_scopes() {
            self.consent.toggle(scope);
        }
        for &scope in scopes {
            if !self.consent.is_granted(scope) {
                self.consent.toggle(scope);
            }
        }
        Ok(self.consent.submit().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope-gated operations
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn accounts(&self) -> Result<AccountSummary> {
        self.consent.require(Scope::Accounts)?;
        Ok(self.gateway.accounts().list().await?)
    }

    pub async fn transactions(&self) -> Result<TransactionList> {
        self.consent.require(Scope::Transactions)?;
        Ok(self.gateway.transactions().list().await?)
    }

    /// Run a private loan evaluation. Needs submitted `loan` consent.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Result<Decision> {
        self.consent.require(Scope::Loan)?;
        Ok(self.pipeline.submit(request).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ungated
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a user-supplied audit event.
    pub async fn record_audit(&self, details: &str) -> Result<()> {
        self.record_audit_action(MANUAL_AUDIT_LOG, details).await
    }

    /// Record a user-supplied event on the configured audit log endpoint.
    pub async fn record_audit_action(&self, action: &str, details: &str) -> Result<()> {
        Ok(self.audit.emit_to_log(action, details).await?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        Ok(self.gateway.health().check().await?)
    }
}

fn cipher_from_config(crypto: &CryptoConfig) -> Result<Arc<dyn PayloadCipher>> {
    match crypto.evaluation_key.as_deref() {
        Some(key) => {
            let cipher = AeadCipher::from_base64_key(key)
                .map_err(|e| DomainError::Config(format!("crypto.evaluation_key: {}", e)))?;
            Ok(Arc::new(cipher))
        }
        None => {
            warn!("No evaluation key configured; using an ephemeral key");
            Ok(Arc::new(AeadCipher::generate()))
        }
    }
}

fn reqwest_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::Config(format!("HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsentError;
    use fintrust_oauth::InMemoryCredentialStore;

    fn config() -> FintrustConfig {
        let mut config = FintrustConfig::new();
        config.crypto.evaluation_key =
            Some("MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=".to_string());
        config
    }

    #[test]
    fn test_services_creation() {
        let services =
            FintrustServices::new(&config(), Arc::new(InMemoryCredentialStore::new())).unwrap();
        assert_eq!(services.gateway().base_url().as_str(), "http://localhost:18000/");
        assert_eq!(
            services.gateway().audit_url().as_str(),
            "http://localhost:8000/api/audit"
        );
        assert!(services.login_url().contains("client_id=frontend-client"));
    }

    #[test]
    fn test_bad_key_is_config_error() {
        let mut config = config();
        config.crypto.evaluation_key = Some("short".to_string());
        let result = FintrustServices::new(&config, Arc::new(InMemoryCredentialStore::new()));
        assert!(matches!(result, Err(DomainError::Config(_))));
    }

    #[test]
    fn test_bad_policy_is_rejected() {
        let mut config = config();
        config.policy.epsilon = 0.0;
        let result = FintrustServices::new(&config, Arc::new(InMemoryCredentialStore::new()));
        assert!(matches!(result, Err(DomainError::Eval(_))));
    }

    #[tokio::test]
    async fn test_gated_operations_need_consent() {
        let services =
            FintrustServices::new(&config(), Arc::new(InMemoryCredentialStore::new())).unwrap();

        let err = services
            .evaluate(EvaluationRequest::new(75_000.0, 720))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Consent(ConsentError::NotSubmitted)
        ));
        assert!(matches!(
            services.accounts().await,
            Err(DomainError::Consent(ConsentError::NotSubmitted))
        ));
    }
}
