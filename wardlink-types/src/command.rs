//! Remote command wire types.
//!
//! Commands are created server-side and delivered to the device on poll.
//! The `type` field is kept as the raw wire string so that unknown types
//! survive deserialization and can be logged and skipped instead of
//! failing the whole batch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A server-issued instruction for the agent to perform a device action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Unique per command, assigned by the server.
    pub id: String,
    /// Raw command type string as received on the wire.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional command-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Command {
    /// Creates a command with no payload.
    pub fn new(id: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            id: id.into(),
            kind: kind.as_wire_str().to_string(),
            payload: None,
        }
    }

    /// Parses the wire type string into a known command kind.
    /// Returns `None` for unrecognized types (forward-compatible default).
    pub fn known_kind(&self) -> Option<CommandKind> {
        CommandKind::from_wire_str(&self.kind)
    }
}

/// The set of command types this agent knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    EnableLocation,
    RequestLocation,
    LockDevice,
    UnlockDevice,
    DisableWifi,
    EnableWifi,
    DisableMobileData,
    EnableMobileData,
}

impl CommandKind {
    /// The wire representation of this kind.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::EnableLocation => "ENABLE_LOCATION",
            Self::RequestLocation => "REQUEST_LOCATION",
            Self::LockDevice => "LOCK_DEVICE",
            Self::UnlockDevice => "UNLOCK_DEVICE",
            Self::DisableWifi => "DISABLE_WIFI",
            Self::EnableWifi => "ENABLE_WIFI",
            Self::DisableMobileData => "DISABLE_MOBILE_DATA",
            Self::EnableMobileData => "ENABLE_MOBILE_DATA",
        }
    }

    /// Parses a wire type string; `None` if unrecognized.
    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "ENABLE_LOCATION" => Some(Self::EnableLocation),
            "REQUEST_LOCATION" => Some(Self::RequestLocation),
            "LOCK_DEVICE" => Some(Self::LockDevice),
            "UNLOCK_DEVICE" => Some(Self::UnlockDevice),
            "DISABLE_WIFI" => Some(Self::DisableWifi),
            "ENABLE_WIFI" => Some(Self::EnableWifi),
            "DISABLE_MOBILE_DATA" => Some(Self::DisableMobileData),
            "ENABLE_MOBILE_DATA" => Some(Self::EnableMobileData),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}
