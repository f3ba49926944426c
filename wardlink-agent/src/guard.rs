//! Admin-revocation guard.
//!
//! Once a parent code and secret code are stored, revoking the
//! administration privilege requires re-entering the secret code; this is
//! what makes the agent tamper-resistant. Before enrollment provisions the
//! codes, revocation proceeds unchallenged.
//!
//! Known gap, deliberate: there is no lockout or attempt counter on
//! secret-code guesses. Adding one is a product decision, not made here.

use crate::capability::AdminCapability;
use crate::error::AgentResult;
use std::sync::Arc;
use tracing::{info, warn};
use wardlink_store::{keys, Store};

/// Whether revocation is currently challenged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Codes are provisioned; revocation requires the secret code.
    Protected,
    /// Pre-enrollment; revocation proceeds without challenge.
    Unprotected,
}

/// Outcome of a revocation confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Privilege revoked; enrollment flags reset.
    Allowed,
    /// Code mismatch; nothing changed. The caller clears the input and
    /// stays in the verification flow.
    Rejected,
}

/// Guards revocation of the administration privilege.
pub struct RevocationGuard {
    store: Store,
    admin: Arc<dyn AdminCapability>,
}

impl RevocationGuard {
    pub fn new(store: Store, admin: Arc<dyn AdminCapability>) -> Self {
        Self { store, admin }
    }

    /// Derives the guard state from the store.
    pub fn state(&self) -> AgentResult<GuardState> {
        let has_secret = self
            .store
            .get_string(keys::SECRET_CODE)?
            .is_some_and(|s| !s.is_empty());
        let has_parent = self
            .store
            .get_string(keys::PARENT_CODE)?
            .is_some_and(|s| !s.is_empty());

        Ok(if has_secret && has_parent {
            GuardState::Protected
        } else {
            GuardState::Unprotected
        })
    }

    /// The message shown in place of the default OS disable dialog while
    /// protected.
    pub fn challenge_message(&self) -> AgentResult<&'static str> {
        Ok(match self.state()? {
            GuardState::Protected => {
                "This device is protected by parental controls. \
                 Enter your 4-digit secret code in the Wardlink app to \
                 disable device administration."
            }
            GuardState::Unprotected => {
                "Disabling device administration will remove parental \
                 controls from this device."
            }
        })
    }

    /// Confirms a revocation attempt with the entered secret code.
    ///
    /// While protected, a match revokes the privilege and resets the
    /// `workflow_completed` and `admin_enabled` flags, returning the
    /// device to the admin-grant step of enrollment. A mismatch changes
    /// nothing and may be retried without limit.
    pub fn confirm_revocation(&self, entered: &str) -> AgentResult<GuardDecision> {
        if self.state()? == GuardState::Unprotected {
            info!("Revocation allowed: device not yet protected");
            self.admin.revoke()?;
            return Ok(GuardDecision::Allowed);
        }

        let stored = self
            .store
            .get_string(keys::SECRET_CODE)?
            .unwrap_or_default();
        if !constant_time_eq(entered.trim().as_bytes(), stored.as_bytes()) {
            warn!("Revocation denied: secret code mismatch");
            return Ok(GuardDecision::Rejected);
        }

        self.admin.revoke()?;
        self.store.set_bool(keys::WORKFLOW_COMPLETED, false)?;
        self.store.set_bool(keys::ADMIN_ENABLED, false)?;
        info!("Administration privilege revoked via secret code");
        Ok(GuardDecision::Allowed)
    }
}

/// Fixed-time byte comparison, so the comparison itself leaks nothing
/// about the match prefix.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
