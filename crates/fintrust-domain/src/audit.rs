//! Audit trail.
//!
//! Application events go to the backend's `/api/audit` route; manual log
//! entries go to the separately configured audit endpoint. Every event is
//! also mirrored to the local `audit` tracing target, so the structured log
//! keeps the trail even when the endpoint is down.

use fintrust_client::{AuditRecord, GatewayClient};
use tracing::{info, warn};

use crate::error::AuditError;

/// The user submitted a consent set.
pub const CONSENT_GRANTED: &str = "consent_granted";

/// A loan decision was shown to the user.
pub const LOAN_RESULT_VIEWED: &str = "loan_result_viewed";

/// Free-form event recorded by the user.
pub const MANUAL_AUDIT_LOG: &str = "manual_audit_log";

#[derive(Debug, Clone, Copy)]
enum Destination {
    Backend,
    AuditLog,
}

/// Posts audit events through the authenticated gateway.
#[derive(Debug, Clone)]
pub struct AuditEmitter {
    gateway: GatewayClient,
}

impl AuditEmitter {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Record one event on the backend. Never retries.
    ///
    /// Without a session nothing is sent and the call fails with
    /// [`AuditError::Unauthenticated`].
    pub async fn emit(&self, action: &str, details: &str) -> Result<(), AuditError> {
        self.post(Destination::Backend, action, details).await
    }

    /// Record one event on the configured audit log endpoint.
    pub async fn emit_to_log(&self, action: &str, details: &str) -> Result<(), AuditError> {
        self.post(Destination::AuditLog, action, details).await
    }

    async fn post(&self, to: Destination, action: &str, details: &str) -> Result<(), AuditError> {
        if self.gateway.token_manager().current_session().await.is_none() {
            warn!(target: "audit", event = action, "Audit event not sent: no session");
            return Err(AuditError::Unauthenticated);
        }

        info!(target: "audit", event = action, details, destination = ?to, "Audit event");

        let record = AuditRecord {
            action: action.to_string(),
            details: details.to_string(),
        };
        let api = self.gateway.audit();
        let sent = match to {
            Destination::Backend => api.record(&record).await,
            Destination::AuditLog => api.record_to_log(&record).await,
        };
        sent.inspect_err(
            |e| warn!(target: "audit", event = action, error = %e, "Audit endpoint rejected event"),
        )?;

        Ok(())
    }

    /// Record an event without failing the caller.
    ///
    /// Returns whether the endpoint accepted the record.
    pub async fn emit_best_effort(&self, action: &str, details: &str) -> bool {
        match self.emit(action, details).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Audit event '{}' was not recorded: {}", action, e);
                false
            }
        }
    }
}
