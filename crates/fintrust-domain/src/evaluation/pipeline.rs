//! Evaluation run state machine.
//!
//! `Idle -> Encrypting -> AwaitingResult -> Decrypting -> Decided`, with
//! `Failed` reachable from any non-terminal state. Every run gets a
//! sequence number; only the most recently issued run may publish its
//! state or decision.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fintrust_client::GatewayClient;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::cipher::{EncryptedPayload, PayloadCipher, open_result, seal_request};
use super::privacy::{NoiseSource, PrivacyPolicy, UniformNoise};
use super::{Decision, EvaluationRequest, EvaluationState};
use crate::audit::{AuditEmitter, LOAN_RESULT_VIEWED};
use crate::error::EvalError;

#[derive(Debug, Default)]
struct RunState {
    sequence: u64,
    state: EvaluationState,
    decision: Option<Decision>,
}

/// Runs private loan evaluations against the remote evaluator.
#[derive(Debug)]
pub struct EvaluationPipeline {
    gateway: GatewayClient,
    audit: AuditEmitter,
    cipher: Arc<dyn PayloadCipher>,
    noise: Arc<dyn NoiseSource>,
    policy: PrivacyPolicy,
    issued: AtomicU64,
    run: Mutex<RunState>,
}

impl EvaluationPipeline {
    pub fn new(gateway: GatewayClient, cipher: Arc<dyn PayloadCipher>, policy: PrivacyPolicy) -> Self {
        Self {
            audit: AuditEmitter::new(gateway.clone()),
            gateway,
            cipher,
            noise: Arc::new(UniformNoise::new()),
            policy,
            issued: AtomicU64::new(0),
            run: Mutex::new(RunState::default()),
        }
    }

    /// Replace the noise source.
    pub fn with_noise(mut self, noise: Arc<dyn NoiseSource>) -> Self {
        self.noise = noise;
        self
    }

    pub fn policy(&self) -> &PrivacyPolicy {
        &self.policy
    }

    /// State of the most recently issued run.
    pub fn state(&self) -> EvaluationState {
        self.run.lock().state
    }

    /// The newest decision published.
    pub fn latest_decision(&self) -> Option<Decision> {
        self.run.lock().decision.clone()
    }

    /// Evaluate one request.
    ///
    /// Invalid input is rejected before a run starts. The `loan_result_viewed`
    /// audit event is best effort; its failure does not fail the decision.
    pub async fn submit(&self, request: EvaluationRequest) -> Result<Decision, EvalError> {
        request.validate()?;

        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.transition(sequence, EvaluationState::Encrypting);
        debug!(sequence, "Evaluation started");

        let result = self.evaluate(sequence, &request).await;

        let latest = self.issued.load(Ordering::SeqCst);
        if sequence != latest {
            match &result {
                Ok(_) => debug!(sequence, latest, "Discarding stale evaluation"),
                Err(e) => debug!(sequence, latest, error = %e, "Discarding stale failed evaluation"),
            }
            return Err(EvalError::Superseded { sequence, latest });
        }

        let raw_score = match result {
            Ok(score) => score,
            Err(e) => {
                self.transition(sequence, EvaluationState::Failed);
                warn!(sequence, error = %e, "Evaluation failed");
                return Err(e);
            }
        };

        let (final_score, outcome) = self.policy.decide(raw_score, self.noise.as_ref());
        let decision = Decision {
            final_score,
            outcome,
            sequence,
        };
        if !self.publish(&decision) {
            let latest = self.issued.load(Ordering::SeqCst);
            return Err(EvalError::Superseded { sequence, latest });
        }
        info!(sequence, %outcome, "Loan evaluated");

        let details = format!(
            "Loan evaluated. Final score: {:.2} ({})",
            decision.final_score, decision.outcome
        );
        self.audit.emit_best_effort(LOAN_RESULT_VIEWED, &details).await;

        Ok(decision)
    }

    /// Encrypt, submit, and decrypt. Returns the raw score.
    async fn evaluate(&self, sequence: u64, request: &EvaluationRequest) -> Result<f64, EvalError> {
        let payload = seal_request(self.cipher.as_ref(), request)
            .map_err(|e| EvalError::Cipher(e.to_string()))?;

        self.transition(sequence, EvaluationState::AwaitingResult);
        let response = self.gateway.loan().evaluate(payload.as_str()).await?;

        self.transition(sequence, EvaluationState::Decrypting);
        let encrypted = match (response.encrypted_loan_result, response.error) {
            (Some(result), _) => EncryptedPayload::from_wire(result),
            (None, Some(error)) => return Err(EvalError::Evaluator(error)),
            (None, None) => {
                return Err(EvalError::Decode(
                    "response carries no encrypted_loan_result".to_string(),
                ));
            }
        };

        open_result(self.cipher.as_ref(), &encrypted).map_err(|e| EvalError::Decode(e.to_string()))
    }

    /// Move the run to `state` if it is still the newest one.
    fn transition(&self, sequence: u64, state: EvaluationState) -> bool {
        let mut run = self.run.lock();
        if sequence != self.issued.load(Ordering::SeqCst) {
            return false;
        }
        run.sequence = sequence;
        run.state = state;
        true
    }

    fn publish(&self, decision: &Decision) -> bool {
        let mut run = self.run.lock();
        if decision.sequence != self.issued.load(Ordering::SeqCst) {
            return false;
        }
        run.sequence = decision.sequence;
        run.state = EvaluationState::Decided;
        run.decision = Some(decision.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::cipher::{AeadCipher, open_request, seal_score};
    use crate::evaluation::privacy::FixedNoise;
    use crate::evaluation::Outcome;
    use crate::test_support::logged_in;
    use fintrust_client::GatewayError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn pipeline(server: &MockServer, cipher: Arc<AeadCipher>) -> EvaluationPipeline {
        EvaluationPipeline::new(logged_in(server), cipher, PrivacyPolicy::default())
            .with_noise(Arc::new(FixedNoise::centered()))
    }

    /// An evaluator that scores `income * factor` on the decrypted request.
    fn evaluator(cipher: Arc<AeadCipher>, factor: f64) -> impl Fn(&Request) -> ResponseTemplate {
        move |req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let payload =
                EncryptedPayload::from_wire(body["encrypted_payload"].as_str().unwrap());
            let request = open_request(cipher.as_ref(), &payload).unwrap();
            let sealed = seal_score(cipher.as_ref(), request.income * factor).unwrap();
            ResponseTemplate::new(200)
                .set_body_json(json!({ "encrypted_loan_result": sealed.as_str() }))
        }
    }

    async fn mount_audit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/audit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_decision_from_decrypted_score() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 1.0))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/audit"))
            .and(body_json(json!({
                "action": "loan_result_viewed",
                "details": "Loan evaluated. Final score: 75000.00 (Eligible)"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, cipher);
        assert_eq!(pipeline.state(), EvaluationState::Idle);

        let decision = pipeline
            .submit(EvaluationRequest::new(75_000.0, 720))
            .await
            .unwrap();
        assert_eq!(decision.final_score, 75_000.0);
        assert_eq!(decision.outcome, Outcome::Eligible);
        assert_eq!(decision.sequence, 1);
        assert_eq!(pipeline.state(), EvaluationState::Decided);
        assert_eq!(pipeline.latest_decision(), Some(decision));
    }

    #[tokio::test]
    async fn test_score_at_threshold_is_denied() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 1.0))
            .mount(&server)
            .await;
        mount_audit(&server).await;

        let decision = pipeline(&server, cipher)
            .submit(EvaluationRequest::new(50_000.0, 700))
            .await
            .unwrap();
        assert_eq!(decision.outcome, Outcome::Denied);
    }

    #[tokio::test]
    async fn test_invalid_input_never_starts_a_run() {
        let server = MockServer::start().await;
        let pipeline = pipeline(&server, Arc::new(AeadCipher::generate()));

        let err = pipeline
            .submit(EvaluationRequest::new(-1.0, 700))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput(_)));
        assert_eq!(pipeline.state(), EvaluationState::Idle);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_fails_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, Arc::new(AeadCipher::generate()));
        let err = pipeline
            .submit(EvaluationRequest::new(75_000.0, 720))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Gateway(GatewayError::Unauthorized)));
        assert_eq!(pipeline.state(), EvaluationState::Failed);
        assert!(pipeline.latest_decision().is_none());
    }

    #[tokio::test]
    async fn test_evaluator_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": "Could not decrypt loan data"})),
            )
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, Arc::new(AeadCipher::generate()));
        let err = pipeline
            .submit(EvaluationRequest::new(75_000.0, 720))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Evaluator(msg) if msg == "Could not decrypt loan data"));
        assert_eq!(pipeline.state(), EvaluationState::Failed);
    }

    #[tokio::test]
    async fn test_undecryptable_result() {
        let server = MockServer::start().await;
        let foreign = AeadCipher::generate();
        let sealed = seal_score(&foreign, 70_000.0).unwrap();
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "encrypted_loan_result": sealed.as_str() })),
            )
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, Arc::new(AeadCipher::generate()));
        let err = pipeline
            .submit(EvaluationRequest::new(75_000.0, 720))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Decode(_)));
        assert_eq!(pipeline.state(), EvaluationState::Failed);
    }

    #[tokio::test]
    async fn test_missing_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let pipeline = pipeline(&server, Arc::new(AeadCipher::generate()));
        assert!(matches!(
            pipeline.submit(EvaluationRequest::new(75_000.0, 720)).await,
            Err(EvalError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_decision() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 0.5))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/audit"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let decision = pipeline(&server, cipher)
            .submit(EvaluationRequest::new(80_000.0, 650))
            .await
            .unwrap();
        assert_eq!(decision.final_score, 40_000.0);
        assert_eq!(decision.outcome, Outcome::Denied);
    }

    #[tokio::test]
    async fn test_noise_is_applied() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 1.0))
            .mount(&server)
            .await;
        mount_audit(&server).await;

        let pipeline = EvaluationPipeline::new(logged_in(&server), cipher, PrivacyPolicy::default())
            .with_noise(Arc::new(FixedNoise::new(0.0)));
        let decision = pipeline
            .submit(EvaluationRequest::new(50_500.0, 700))
            .await
            .unwrap();
        assert_eq!(decision.final_score, 49_500.0);
        assert_eq!(decision.outcome, Outcome::Denied);
    }

    #[tokio::test]
    async fn test_stale_run_is_superseded() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        let slow = seal_score(cipher.as_ref(), 10_000.0).unwrap();
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "encrypted_loan_result": slow.as_str() }))
                    .set_delay(Duration::from_millis(300)),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 1.0))
            .mount(&server)
            .await;
        mount_audit(&server).await;

        let pipeline = pipeline(&server, cipher);
        let request = EvaluationRequest::new(90_000.0, 800);
        let (first, second) = tokio::join!(pipeline.submit(request), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            pipeline.submit(request).await
        });

        assert!(matches!(
            first,
            Err(EvalError::Superseded {
                sequence: 1,
                latest: 2
            })
        ));
        let second = second.unwrap();
        assert_eq!(second.sequence, 2);
        assert_eq!(second.outcome, Outcome::Eligible);
        assert_eq!(pipeline.state(), EvaluationState::Decided);
        assert_eq!(pipeline.latest_decision(), Some(second));

        let audits = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/api/audit")
            .count();
        assert_eq!(audits, 1);
    }

    #[tokio::test]
    async fn test_stale_failure_leaves_newer_run_visible() {
        let server = MockServer::start().await;
        let cipher = Arc::new(AeadCipher::generate());
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/loan/evaluate"))
            .respond_with(evaluator(cipher.clone(), 1.0))
            .mount(&server)
            .await;
        mount_audit(&server).await;

        let pipeline = pipeline(&server, cipher);
        let request = EvaluationRequest::new(90_000.0, 800);
        let (first, second) = tokio::join!(pipeline.submit(request), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            pipeline.submit(request).await
        });

        assert!(matches!(
            first,
            Err(EvalError::Superseded {
                sequence: 1,
                latest: 2
            })
        ));
        assert_eq!(second.unwrap().sequence, 2);
        assert_eq!(pipeline.state(), EvaluationState::Decided);
    }
}
