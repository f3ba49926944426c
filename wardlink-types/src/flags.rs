//! Enrollment progress record.
//!
//! Progress through the enrollment workflow is represented purely as a set
//! of monotonic boolean flags; the current step is always *derived* as the
//! first false flag in the fixed order, never stored independently. This
//! removes step-counter desync as a class of bugs: there is no counter to
//! fall out of agreement with the flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The persisted flags of the enrollment workflow, in workflow order.
///
/// Flags are set true monotonically as the workflow advances and never
/// revert, except for `workflow_completed` and `admin_enabled`, which the
/// revocation guard resets when the administration privilege is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentFlags {
    /// Parent code accepted and verified against the server.
    pub code_verified: bool,
    /// 4-digit secret code stored locally.
    pub secret_code_set: bool,
    /// Administration privilege granted by the user.
    pub admin_enabled: bool,
    /// Location capability granted.
    pub location_enabled: bool,
    /// Device registered with the server.
    pub registered: bool,
    /// Workflow finished; the command loop is live.
    pub workflow_completed: bool,
}

impl EnrollmentFlags {
    /// The flags in fixed workflow order.
    pub fn ordered(&self) -> [bool; 6] {
        [
            self.code_verified,
            self.secret_code_set,
            self.admin_enabled,
            self.location_enabled,
            self.registered,
            self.workflow_completed,
        ]
    }

    /// Derives the current step as the index of the first false flag.
    pub fn current_step(&self) -> EnrollmentStep {
        match self
            .ordered()
            .iter()
            .position(|&set| !set)
        {
            Some(0) => EnrollmentStep::VerifyCode,
            Some(1) => EnrollmentStep::SetSecretCode,
            Some(2) => EnrollmentStep::EnableAdmin,
            Some(3) => EnrollmentStep::EnableLocation,
            Some(4) => EnrollmentStep::Register,
            Some(_) => EnrollmentStep::Activate,
            None => EnrollmentStep::Done,
        }
    }

    /// True when the flags form a valid prefix: no flag is set unless all
    /// flags before it are set.
    pub fn is_prefix(&self) -> bool {
        let ordered = self.ordered();
        ordered.windows(2).all(|pair| pair[0] || !pair[1])
    }
}

/// A step of the enrollment workflow, derived from [`EnrollmentFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStep {
    /// Accept the 10-character parent code and verify it with the server.
    VerifyCode,
    /// Accept and persist the 4-digit secret code.
    SetSecretCode,
    /// Wait for the administration privilege grant.
    EnableAdmin,
    /// Wait for the location capability grant.
    EnableLocation,
    /// Register the device with the server.
    Register,
    /// Start monitoring and mark the workflow complete.
    Activate,
    /// Terminal state; further advancement is a no-op.
    Done,
}

impl fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VerifyCode => "verify-code",
            Self::SetSecretCode => "set-secret-code",
            Self::EnableAdmin => "enable-admin",
            Self::EnableLocation => "enable-location",
            Self::Register => "register",
            Self::Activate => "activate",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
