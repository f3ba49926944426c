//! Enrollment state machine.
//!
//! Drives the linear workflow that binds an unconfigured device to a
//! parent account: code verification, secret-code provisioning, capability
//! grants, server registration, activation. Progress is persisted as
//! monotonic flags; the current step is derived fresh from the store
//! before every transition, so concurrent advance attempts observe each
//! other's writes and retries are always safe.

use crate::api::ManagementClient;
use crate::capability::{AdminCapability, LocationSubsystem};
use crate::device::DeviceInfo;
use crate::error::{AgentError, AgentResult};
use std::sync::Arc;
use tracing::{info, warn};
use wardlink_store::{keys, Store};
use wardlink_types::{EnrollmentFlags, EnrollmentStep};

/// Input to [`EnrollmentWorkflow::advance`]. Must match the current
/// derived step, or the call fails with a validation error and the record
/// is left unchanged.
#[derive(Debug, Clone)]
pub enum AdvanceInput {
    /// The 10-character parent code (verify-code step).
    ParentCode(String),
    /// The 4-digit secret code (set-secret-code step).
    SecretCode(String),
    /// No-payload trigger for the capability-grant, registration, and
    /// activation steps.
    Confirm,
}

/// Result of a successful advancement.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The step the workflow is now at.
    pub step: EnrollmentStep,
    /// User-facing status message.
    pub message: String,
}

/// The enrollment workflow state machine.
pub struct EnrollmentWorkflow {
    store: Store,
    client: ManagementClient,
    device_identity: String,
    admin: Arc<dyn AdminCapability>,
    location: Arc<dyn LocationSubsystem>,
}

impl EnrollmentWorkflow {
    pub fn new(
        store: Store,
        client: ManagementClient,
        device_identity: impl Into<String>,
        admin: Arc<dyn AdminCapability>,
        location: Arc<dyn LocationSubsystem>,
    ) -> Self {
        Self {
            store,
            client,
            device_identity: device_identity.into(),
            admin,
            location,
        }
    }

    /// Reads the enrollment flags fresh from the store.
    pub fn flags(&self) -> AgentResult<EnrollmentFlags> {
        Ok(EnrollmentFlags {
            code_verified: self.store.get_bool(keys::CODE_VERIFIED)?,
            secret_code_set: self.store.get_bool(keys::SECRET_CODE_SET)?,
            admin_enabled: self.store.get_bool(keys::ADMIN_ENABLED)?,
            location_enabled: self.store.get_bool(keys::LOCATION_ENABLED)?,
            registered: self.store.get_bool(keys::REGISTERED)?,
            workflow_completed: self.store.get_bool(keys::WORKFLOW_COMPLETED)?,
        })
    }

    /// The current derived step.
    pub fn current_step(&self) -> AgentResult<EnrollmentStep> {
        Ok(self.flags()?.current_step())
    }

    /// Attempts one workflow transition with the given input.
    ///
    /// On any error the record is unchanged and the same step can be
    /// retried. After completion the machine is a benign pass-through.
    pub async fn advance(&self, input: AdvanceInput) -> AgentResult<StepOutcome> {
        let step = self.current_step()?;
        match (step, input) {
            (EnrollmentStep::Done, _) => Ok(StepOutcome {
                step: EnrollmentStep::Done,
                message: "Enrollment already complete".to_string(),
            }),
            (EnrollmentStep::VerifyCode, AdvanceInput::ParentCode(code)) => {
                self.verify_parent_code(&code).await
            }
            (EnrollmentStep::SetSecretCode, AdvanceInput::SecretCode(code)) => {
                self.set_secret_code(&code).await
            }
            (EnrollmentStep::EnableAdmin, AdvanceInput::Confirm) => self.enable_admin(),
            (EnrollmentStep::EnableLocation, AdvanceInput::Confirm) => self.enable_location(),
            (EnrollmentStep::Register, AdvanceInput::Confirm) => self.register().await,
            (EnrollmentStep::Activate, AdvanceInput::Confirm) => self.activate(),
            (step, _) => Err(AgentError::Validation(format!(
                "input does not match current enrollment step ({step})"
            ))),
        }
    }

    async fn verify_parent_code(&self, code: &str) -> AgentResult<StepOutcome> {
        let code = code.trim().to_uppercase();
        if code.len() != 10 {
            return Err(AgentError::Validation(
                "parent code must be exactly 10 characters".to_string(),
            ));
        }

        // Persist before verifying so the code is retained for retry.
        self.store.set_string(keys::PARENT_CODE, &code)?;

        let valid = self.client.verify_code(&code, &self.device_identity).await?;
        if !valid {
            return Err(AgentError::Server(
                "invalid parent code, please check and try again".to_string(),
            ));
        }

        self.store.set_bool(keys::CODE_VERIFIED, true)?;
        info!("Parent code verified");
        self.outcome("Parent code verified")
    }

    async fn set_secret_code(&self, code: &str) -> AgentResult<StepOutcome> {
        let code = code.trim();
        if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AgentError::Validation(
                "secret code must be exactly 4 digits".to_string(),
            ));
        }

        self.store.set_string(keys::SECRET_CODE, code)?;
        self.store.set_bool(keys::SECRET_CODE_SET, true)?;
        info!("Secret code stored");

        // Best-effort server sync; the local copy is authoritative for the
        // revocation guard, so failure never blocks advancement.
        let parent_code = self
            .store
            .get_string(keys::PARENT_CODE)?
            .unwrap_or_default();
        match self
            .client
            .save_secret_code(&parent_code, &self.device_identity, code)
            .await
        {
            Ok(true) => info!("Secret code synced to server"),
            Ok(false) => warn!("Server declined secret code sync"),
            Err(e) => warn!("Secret code sync failed (non-fatal): {e}"),
        }

        self.outcome("Secret code saved")
    }

    fn enable_admin(&self) -> AgentResult<StepOutcome> {
        if !self.admin.is_active() {
            self.admin.request_grant()?;
        }
        if !self.admin.is_active() {
            return Err(AgentError::Capability(
                "administration privilege not granted".to_string(),
            ));
        }

        self.store.set_bool(keys::ADMIN_ENABLED, true)?;
        info!("Administration privilege enabled");
        self.outcome("Administration privilege enabled")
    }

    fn enable_location(&self) -> AgentResult<StepOutcome> {
        if !self.location.is_granted() {
            self.location.request_grant()?;
        }
        if !self.location.is_granted() {
            return Err(AgentError::Capability(
                "location capability not granted".to_string(),
            ));
        }

        self.store.set_bool(keys::LOCATION_ENABLED, true)?;
        info!("Location capability enabled");
        self.outcome("Location access enabled")
    }

    async fn register(&self) -> AgentResult<StepOutcome> {
        let parent_code = self
            .store
            .get_string(keys::PARENT_CODE)?
            .unwrap_or_default();
        let device_info = serde_json::to_value(DeviceInfo::collect())?;

        let result = self
            .client
            .register_device(&parent_code, &self.device_identity, device_info)
            .await?;
        if !result.success {
            return Err(AgentError::Server(
                result
                    .message
                    .unwrap_or_else(|| "device registration failed".to_string()),
            ));
        }

        self.store.set_bool(keys::REGISTERED, true)?;
        info!("Device registered");
        self.outcome("Device registered")
    }

    fn activate(&self) -> AgentResult<StepOutcome> {
        // The command loop runs from process start and picks the flag up
        // on its next tick; only the location subsystem needs a kick here.
        if let Err(e) = self.location.start_background() {
            warn!("Failed to start location subsystem during activation: {e}");
        }

        self.store.set_bool(keys::WORKFLOW_COMPLETED, true)?;
        info!("Enrollment workflow completed");
        self.outcome("Setup completed, device is now managed")
    }

    fn outcome(&self, message: &str) -> AgentResult<StepOutcome> {
        Ok(StepOutcome {
            step: self.current_step()?,
            message: message.to_string(),
        })
    }
}
