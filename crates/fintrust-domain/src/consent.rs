//! Per-session consent ledger.
//!
//! Consent lives in memory only. It is granted scope by scope, confirmed
//! with [`ConsentLedger::submit`], and dropped on logout or a new login.

use std::fmt;
use std::str::FromStr;

use fintrust_oauth::SharedTokenManager;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audit::{AuditEmitter, CONSENT_GRANTED};
use crate::error::ConsentError;

/// A data-access scope the user can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Accounts,
    Transactions,
    Loan,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Accounts, Scope::Transactions, Scope::Loan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Accounts => "accounts",
            Scope::Transactions => "transactions",
            Scope::Loan => "loan",
        }
    }

    /// What granting this scope allows, as shown to the user.
    pub fn description(&self) -> &'static str {
        match self {
            Scope::Accounts => "View your account balances and types",
            Scope::Transactions => "Access your transaction history",
            Scope::Loan => "Allow encrypted loan eligibility check",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == name)
            .ok_or_else(|| ConsentError::UnknownScope(s.to_string()))
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Granted scopes, oldest grant first.
    granted: Vec<Scope>,
    submitted: bool,
}

/// Which scopes the user has granted in this session.
#[derive(Debug)]
pub struct ConsentLedger {
    state: Mutex<LedgerState>,
    tokens: SharedTokenManager,
    audit: AuditEmitter,
}

impl ConsentLedger {
    pub fn new(tokens: SharedTokenManager, audit: AuditEmitter) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            tokens,
            audit,
        }
    }

    /// Flip one scope. Returns whether it is now granted.
    ///
    /// Any change to the granted set requires a new [`submit`](Self::submit).
    pub fn toggle(&self, scope: Scope) -> bool {
        let mut state = self.state.lock();
        let granted = match state.granted.iter().position(|s| *s == scope) {
            Some(index) => {
                state.granted.remove(index);
                false
            }
            None => {
                state.granted.push(scope);
                true
            }
        };
        state.submitted = false;
        debug!(%scope, granted, "Consent toggled");
        granted
    }

    /// Currently granted scopes, in the order they were granted.
    pub fn granted_scopes(&self) -> Vec<Scope> {
        self.state.lock().granted.clone()
    }

    pub fn is_granted(&self, scope: Scope) -> bool {
        self.state.lock().granted.contains(&scope)
    }

    /// Whether the current granted set has been submitted and audited.
    pub fn is_submitted(&self) -> bool {
        self.state.lock().submitted
    }

    /// Confirm the granted set.
    ///
    /// Needs a session and at least one granted scope, checked in that
    /// order. Consent only takes effect once the `consent_granted` audit
    /// record has been accepted.
    pub async fn submit(&self) -> Result<Vec<Scope>, ConsentError> {
        if self.tokens.current_session().await.is_none() {
            return Err(ConsentError::NoSession);
        }

        let scopes = self.granted_scopes();
        if scopes.is_empty() {
            return Err(ConsentError::NoScopesSelected);
        }

        let details = format!("User granted consent for: {}", join_scopes(&scopes));
        self.audit.emit(CONSENT_GRANTED, &details).await?;

        let mut state = self.state.lock();
        // The set may have been toggled while the audit was in flight.
        state.submitted = state.granted == scopes;
        info!(scopes = %join_scopes(&scopes), "Consent submitted");
        Ok(scopes)
    }

    /// Succeeds only when consent was submitted and includes `scope`.
    pub fn require(&self, scope: Scope) -> Result<(), ConsentError> {
        let state = self.state.lock();
        if !state.submitted {
            return Err(ConsentError::NotSubmitted);
        }
        if !state.granted.contains(&scope) {
            return Err(ConsentError::ScopeNotGranted(scope));
        }
        Ok(())
    }

    /// Drop all consent.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        *state = LedgerState::default();
        debug!("Consent cleared");
    }
}

fn join_scopes(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(Scope::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
