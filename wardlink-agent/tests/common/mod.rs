//! Shared test helpers for agent tests.

#![allow(dead_code)]

use serde_json::json;
use wardlink_agent::{AgentConfig, ManagementClient};
use wardlink_store::{keys, Store};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEVICE_ID: &str = "device-imei-001";
pub const PARENT_CODE: &str = "ABCD123456";
pub const SECRET_CODE: &str = "4321";

/// Installs a subscriber once so `RUST_LOG` works during test runs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn store() -> Store {
    Store::open_in_memory().unwrap()
}

/// A store representing a fully enrolled device.
pub fn enrolled_store() -> Store {
    let store = store();
    store.set_string(keys::PARENT_CODE, PARENT_CODE).unwrap();
    store.set_string(keys::SECRET_CODE, SECRET_CODE).unwrap();
    store.set_string(keys::DEVICE_IDENTITY, DEVICE_ID).unwrap();
    for key in [
        keys::CODE_VERIFIED,
        keys::SECRET_CODE_SET,
        keys::ADMIN_ENABLED,
        keys::LOCATION_ENABLED,
        keys::REGISTERED,
        keys::WORKFLOW_COMPLETED,
    ] {
        store.set_bool(key, true).unwrap();
    }
    store
}

/// A client pointed at the given base URL with short test timeouts.
pub fn client_for(base_url: &str) -> ManagementClient {
    let config = AgentConfig {
        server_url: base_url.to_string(),
        connect_timeout: std::time::Duration::from_secs(2),
        read_timeout: std::time::Duration::from_secs(2),
        ..Default::default()
    };
    ManagementClient::new(&config).unwrap()
}

/// A client pointed at a port nothing listens on (transport failures).
pub fn unreachable_client() -> ManagementClient {
    client_for("http://127.0.0.1:9")
}

/// Mounts a check-commands response returning the given command JSON list.
pub async fn mount_commands(server: &MockServer, commands: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/check-commands/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "commands": commands })))
        .mount(server)
        .await;
}

/// Mounts a 200 acknowledge-command endpoint expecting `expected` calls.
pub async fn mount_ack(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/acknowledge-command"))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(server)
        .await;
}
