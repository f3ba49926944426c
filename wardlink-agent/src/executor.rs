//! Command execution.
//!
//! Dispatches each server command to the corresponding capability
//! primitive. Every handler is safe to run zero, one, or many times with
//! the same net effect, because the server may redeliver commands whose
//! acknowledgment was lost. Failures never propagate out of `execute`:
//! they are logged and surfaced through the notifier, and the caller
//! acknowledges the command regardless.

use crate::capability::{AdminCapability, LocationSubsystem, NetworkControl, Notifier};
use std::sync::Arc;
use tracing::{info, warn};
use wardlink_store::{keys, Store};
use wardlink_types::{Command, CommandKind};

/// Executes server commands against the injected capability primitives.
pub struct CommandExecutor {
    store: Store,
    admin: Arc<dyn AdminCapability>,
    network: Arc<dyn NetworkControl>,
    location: Arc<dyn LocationSubsystem>,
    notifier: Arc<dyn Notifier>,
}

impl CommandExecutor {
    pub fn new(
        store: Store,
        admin: Arc<dyn AdminCapability>,
        network: Arc<dyn NetworkControl>,
        location: Arc<dyn LocationSubsystem>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            admin,
            network,
            location,
            notifier,
        }
    }

    /// Executes one command. Never fails; unknown types are logged and
    /// ignored.
    pub fn execute(&self, command: &Command) {
        let Some(kind) = command.known_kind() else {
            warn!("Unknown command type {:?} (id {}), ignoring", command.kind, command.id);
            return;
        };

        info!("Executing command {} ({kind})", command.id);
        match kind {
            CommandKind::EnableLocation => self.enable_location(),
            CommandKind::RequestLocation => self.request_location(),
            CommandKind::LockDevice => self.lock_device(),
            CommandKind::UnlockDevice => self.unlock_device(),
            CommandKind::DisableWifi => self.set_wireless(false),
            CommandKind::EnableWifi => self.set_wireless(true),
            CommandKind::DisableMobileData => self.set_mobile_data(false),
            CommandKind::EnableMobileData => self.set_mobile_data(true),
        }
    }

    fn enable_location(&self) {
        match self.location.start_background() {
            Ok(()) => self.notifier.notify("Location tracking active"),
            Err(e) => {
                warn!("Failed to start location subsystem: {e}");
                self.notifier.notify("Location service unavailable");
            }
        }
    }

    fn request_location(&self) {
        match self.location.request_sample() {
            Ok(()) => self.notifier.notify("Sending location update"),
            Err(e) => {
                warn!("Location sample failed: {e}");
                self.notifier.notify("Location update unavailable");
            }
        }
    }

    fn lock_device(&self) {
        if !self.admin.is_active() {
            warn!("Cannot lock device: administration privilege not active");
            self.notifier.notify("Device lock failed: admin required");
            return;
        }

        if let Err(e) = self.store.set_bool(keys::LOCK_INTENT, true) {
            warn!("Failed to record lock intent: {e}");
        }
        match self.admin.lock_now() {
            Ok(()) => self.notifier.notify("Device locked"),
            Err(e) => {
                warn!("Lock primitive failed: {e}");
                self.notifier.notify("Device lock failed: admin required");
            }
        }
    }

    fn unlock_device(&self) {
        // The lock primitive is fire-and-forget; unlocking clears the
        // local intent so re-locks are driven only by fresh commands.
        if let Err(e) = self.store.set_bool(keys::LOCK_INTENT, false) {
            warn!("Failed to clear lock intent: {e}");
        }
        self.notifier.notify("Device unlocked");
    }

    fn set_wireless(&self, enable: bool) {
        // Only disabling is privileged.
        if !enable && !self.admin.is_active() {
            warn!("Cannot disable wireless: administration privilege not active");
            self.notifier.notify("Wireless control unavailable");
            return;
        }

        if self.network.wireless_enabled() == enable {
            // Redelivery-safe no-op.
            self.notifier.notify(if enable {
                "Wireless already enabled"
            } else {
                "Wireless already disabled"
            });
            return;
        }

        match self.network.set_wireless(enable) {
            Ok(()) => self.notifier.notify(if enable {
                "Wireless enabled"
            } else {
                "Wireless disabled"
            }),
            Err(e) => {
                warn!("Wireless toggle failed: {e}");
                self.notifier.notify("Wireless control unavailable");
            }
        }
    }

    fn set_mobile_data(&self, enable: bool) {
        if !self.admin.is_active() {
            warn!("Cannot toggle mobile data: administration privilege not active");
            self.notifier.notify("Mobile data: limited control");
            return;
        }

        // Direct toggle first; policy-level restriction as fallback.
        match self.network.set_mobile_data(enable) {
            Ok(true) => self.notifier.notify(if enable {
                "Mobile data enabled"
            } else {
                "Mobile data disabled"
            }),
            Ok(false) => match self.network.set_network_restriction(!enable) {
                Ok(()) => self.notifier.notify(if enable {
                    "Network restriction removed"
                } else {
                    "Network restriction applied"
                }),
                Err(e) => {
                    warn!("Network restriction fallback failed: {e}");
                    self.notifier.notify("Mobile data: limited control");
                }
            },
            Err(e) => {
                warn!("Mobile data toggle failed: {e}");
                self.notifier.notify("Mobile data: limited control");
            }
        }
    }
}
