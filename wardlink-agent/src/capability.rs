//! Capability seams for OS-mediated primitives.
//!
//! The administration privilege, network toggles, the location subsystem,
//! and user-facing status notifications are injected behind traits so the
//! core can run against fakes in tests. Real implementations live in the
//! platform glue outside this crate.

use crate::error::AgentResult;
use tracing::info;

/// The privileged, user-grantable administration capability.
pub trait AdminCapability: Send + Sync {
    /// Whether the privilege is currently granted.
    fn is_active(&self) -> bool;

    /// Asks the OS to present the grant flow. Whether the grant succeeded
    /// is observed via [`is_active`](Self::is_active) afterwards.
    fn request_grant(&self) -> AgentResult<()>;

    /// Programmatically revokes the privilege.
    fn revoke(&self) -> AgentResult<()>;

    /// Locks the device immediately. Requires the privilege to be active.
    fn lock_now(&self) -> AgentResult<()>;
}

/// Network toggle primitives, gated by the administration capability.
pub trait NetworkControl: Send + Sync {
    /// Whether the wireless interface is currently enabled.
    fn wireless_enabled(&self) -> bool;

    /// Enables or disables the wireless interface.
    fn set_wireless(&self, enabled: bool) -> AgentResult<()>;

    /// Attempts a direct mobile-data toggle. Returns `Ok(false)` when the
    /// platform exposes no direct primitive (the caller falls back to a
    /// policy-level restriction).
    fn set_mobile_data(&self, enabled: bool) -> AgentResult<bool>;

    /// Applies or removes a policy-level network restriction.
    fn set_network_restriction(&self, restricted: bool) -> AgentResult<()>;
}

/// The location-producing subsystem, started and stopped on demand.
pub trait LocationSubsystem: Send + Sync {
    /// Whether the location capability has been granted.
    fn is_granted(&self) -> bool;

    /// Asks the OS to present the location grant flow.
    fn request_grant(&self) -> AgentResult<()>;

    /// Starts continuous background location reporting.
    fn start_background(&self) -> AgentResult<()>;

    /// Triggers one immediate location sample and report.
    fn request_sample(&self) -> AgentResult<()>;
}

/// Sink for user-visible status messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that writes status messages to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("Status: {message}");
    }
}

/// Recording fakes for testing the core without an OS.
pub mod mock {
    use super::*;
    use crate::error::AgentError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fake administration capability with scriptable grant behavior.
    #[derive(Debug, Default)]
    pub struct MockAdmin {
        active: AtomicBool,
        grant_on_request: AtomicBool,
        lock_count: AtomicUsize,
    }

    impl MockAdmin {
        pub fn new() -> Self {
            Self::default()
        }

        /// A capability that is already granted.
        pub fn granted() -> Self {
            let admin = Self::default();
            admin.active.store(true, Ordering::SeqCst);
            admin
        }

        /// Makes the next `request_grant` succeed (simulating the user
        /// accepting the OS dialog).
        pub fn accept_next_grant(&self) {
            self.grant_on_request.store(true, Ordering::SeqCst);
        }

        /// Number of times the lock primitive fired.
        pub fn lock_count(&self) -> usize {
            self.lock_count.load(Ordering::SeqCst)
        }
    }

    impl AdminCapability for MockAdmin {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn request_grant(&self) -> AgentResult<()> {
            if self.grant_on_request.load(Ordering::SeqCst) {
                self.active.store(true, Ordering::SeqCst);
            }
            Ok(())
        }

        fn revoke(&self) -> AgentResult<()> {
            self.active.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn lock_now(&self) -> AgentResult<()> {
            if !self.active.load(Ordering::SeqCst) {
                return Err(AgentError::Capability(
                    "administration privilege not active".into(),
                ));
            }
            self.lock_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fake network primitives tracking interface and restriction state.
    #[derive(Debug)]
    pub struct MockNetwork {
        wireless: AtomicBool,
        mobile_data: AtomicBool,
        direct_data_toggle: bool,
        restricted: AtomicBool,
    }

    impl MockNetwork {
        /// Both interfaces up; direct mobile-data toggle available.
        pub fn new() -> Self {
            Self {
                wireless: AtomicBool::new(true),
                mobile_data: AtomicBool::new(true),
                direct_data_toggle: true,
                restricted: AtomicBool::new(false),
            }
        }

        /// A platform without a direct mobile-data primitive.
        pub fn without_direct_data_toggle() -> Self {
            Self {
                direct_data_toggle: false,
                ..Self::new()
            }
        }

        pub fn wireless_is_enabled(&self) -> bool {
            self.wireless.load(Ordering::SeqCst)
        }

        pub fn mobile_data_is_enabled(&self) -> bool {
            self.mobile_data.load(Ordering::SeqCst)
        }

        pub fn is_restricted(&self) -> bool {
            self.restricted.load(Ordering::SeqCst)
        }
    }

    impl Default for MockNetwork {
        fn default() -> Self {
            Self::new()
        }
    }

    impl NetworkControl for MockNetwork {
        fn wireless_enabled(&self) -> bool {
            self.wireless.load(Ordering::SeqCst)
        }

        fn set_wireless(&self, enabled: bool) -> AgentResult<()> {
            self.wireless.store(enabled, Ordering::SeqCst);
            Ok(())
        }

        fn set_mobile_data(&self, enabled: bool) -> AgentResult<bool> {
            if !self.direct_data_toggle {
                return Ok(false);
            }
            self.mobile_data.store(enabled, Ordering::SeqCst);
            Ok(true)
        }

        fn set_network_restriction(&self, restricted: bool) -> AgentResult<()> {
            self.restricted.store(restricted, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fake location subsystem counting starts and samples.
    #[derive(Debug, Default)]
    pub struct MockLocation {
        granted: AtomicBool,
        grant_on_request: AtomicBool,
        background_running: AtomicBool,
        samples: AtomicUsize,
    }

    impl MockLocation {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn granted() -> Self {
            let location = Self::default();
            location.granted.store(true, Ordering::SeqCst);
            location
        }

        pub fn accept_next_grant(&self) {
            self.grant_on_request.store(true, Ordering::SeqCst);
        }

        pub fn background_running(&self) -> bool {
            self.background_running.load(Ordering::SeqCst)
        }

        pub fn sample_count(&self) -> usize {
            self.samples.load(Ordering::SeqCst)
        }
    }

    impl LocationSubsystem for MockLocation {
        fn is_granted(&self) -> bool {
            self.granted.load(Ordering::SeqCst)
        }

        fn request_grant(&self) -> AgentResult<()> {
            if self.grant_on_request.load(Ordering::SeqCst) {
                self.granted.store(true, Ordering::SeqCst);
            }
            Ok(())
        }

        fn start_background(&self) -> AgentResult<()> {
            self.background_running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn request_sample(&self) -> AgentResult<()> {
            self.samples.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Notifier that records every message for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        /// Whether any recorded message contains the given fragment.
        pub fn saw(&self, fragment: &str) -> bool {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.contains(fragment))
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}
