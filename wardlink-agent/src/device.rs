//! Device identity and registration info.
//!
//! The server addresses a device by a stable string identity. We prefer
//! the platform machine id; when unavailable, a hash over stable host
//! attributes stands in. The identity is persisted on first resolution so
//! the device keeps reporting the same value even if host attributes
//! drift later.

use crate::error::AgentResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use tracing::debug;
use wardlink_store::{keys, Store};

/// Information about the device, reported at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub os_name: String,
    pub os_version: String,
    pub hostname: String,
    pub arch: String,
}

impl DeviceInfo {
    /// Collects information about the current device.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            os_name: env::consts::OS.to_string(),
            os_version: os_version(),
            hostname: hostname(),
            arch: env::consts::ARCH.to_string(),
        }
    }
}

/// The stable identity this device reports to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Resolves the device identity: the persisted value if present,
    /// otherwise a freshly derived one, persisted for future runs.
    pub fn resolve(store: &Store) -> AgentResult<Self> {
        if let Some(id) = store.get_string(keys::DEVICE_IDENTITY)? {
            if !id.is_empty() {
                return Ok(Self(id));
            }
        }

        let id = derive_identity();
        store.set_string(keys::DEVICE_IDENTITY, &id)?;
        debug!("Derived device identity: {}****", &id[..4.min(id.len())]);
        Ok(Self(id))
    }

    /// The identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a stable identity: machine id when the platform has one, else
/// a digest over stable host attributes.
fn derive_identity() -> String {
    if let Some(machine_id) = machine_id() {
        return machine_id;
    }

    let mut hasher = Sha256::new();
    for part in [
        env::consts::OS,
        env::consts::ARCH,
        &hostname(),
        &env::var("USER")
            .or_else(|_| env::var("USERNAME"))
            .unwrap_or_default(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    let digest = hasher.finalize();
    BASE64.encode(&digest[..16])
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn os_version() -> String {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| l.trim_start_matches("VERSION_ID=").trim_matches('"').to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        "unknown".to_string()
    }
}
