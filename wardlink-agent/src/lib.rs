//! Device-side agent core for Wardlink parental device management.
//!
//! Two long-lived units share the durable store:
//!
//! - **Enrollment workflow** ([`EnrollmentWorkflow`]): a linear, persisted,
//!   idempotent state machine that turns an unconfigured device into a
//!   managed one. Progress is a set of monotonic flags; the current step is
//!   always derived from them.
//! - **Command loop** ([`CommandPoller`]): polls the management server for
//!   pending commands, executes each through injected capability
//!   primitives, and acknowledges every attempt. Runs from process start
//!   and no-ops until enrollment completes.
//!
//! A third, small unit — the [`RevocationGuard`] — gates removal of the
//! administration privilege behind the locally stored secret code.
//!
//! OS-granted primitives (administration, network toggles, location) are
//! trait seams in [`capability`], so the core runs against fakes in tests.

mod api;
pub mod capability;
mod config;
mod device;
mod enrollment;
mod error;
mod executor;
mod guard;
mod poller;

pub use api::{ManagementClient, RegisterOutcome};
pub use capability::{AdminCapability, LocationSubsystem, LogNotifier, NetworkControl, Notifier};
pub use config::AgentConfig;
pub use device::{DeviceIdentity, DeviceInfo};
pub use enrollment::{AdvanceInput, EnrollmentWorkflow, StepOutcome};
pub use error::{AgentError, AgentResult};
pub use executor::CommandExecutor;
pub use guard::{GuardDecision, GuardState, RevocationGuard};
pub use poller::CommandPoller;
