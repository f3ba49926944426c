mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wardlink_agent::capability::mock::{MockAdmin, MockLocation, MockNetwork, RecordingNotifier};
use wardlink_agent::{CommandExecutor, CommandPoller, ManagementClient};
use wardlink_store::Store;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    store: Store,
    admin: Arc<MockAdmin>,
    network: Arc<MockNetwork>,
    location: Arc<MockLocation>,
    notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    fn new(store: Store) -> Self {
        init_tracing();
        Self {
            store,
            admin: Arc::new(MockAdmin::granted()),
            network: Arc::new(MockNetwork::new()),
            location: Arc::new(MockLocation::granted()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    fn poller(&self, client: ManagementClient) -> CommandPoller {
        let executor = CommandExecutor::new(
            self.store.clone(),
            self.admin.clone(),
            self.network.clone(),
            self.location.clone(),
            self.notifier.clone(),
        );
        CommandPoller::new(
            self.store.clone(),
            client,
            DEVICE_ID,
            executor,
            Duration::from_secs(30),
        )
    }
}

// ── Cycle gating ──

#[tokio::test]
async fn unenrolled_device_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/check-commands/{DEVICE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "commands": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let fx = Fixture::new(store());
    fx.poller(client_for(&server.uri())).poll_once().await;

    server.verify().await;
}

#[tokio::test]
async fn unreachable_server_skips_the_cycle() {
    let fx = Fixture::new(enrolled_store());
    // Completes without executing anything; the next tick retries.
    fx.poller(unreachable_client()).poll_once().await;
    assert!(fx.notifier.messages().is_empty());
}

// ── Command dispatch ──

#[tokio::test]
async fn commands_are_executed_in_order_and_each_acknowledged() {
    let server = MockServer::start().await;
    mount_commands(
        &server,
        json!([
            { "id": "41", "type": "DISABLE_WIFI" },
            { "id": "42", "type": "ENABLE_WIFI" },
            { "id": "43", "type": "REQUEST_LOCATION" },
        ]),
    )
    .await;
    mount_ack(&server, 3).await;

    let fx = Fixture::new(enrolled_store());
    fx.poller(client_for(&server.uri())).poll_once().await;

    // In-order execution: the later enable wins.
    assert!(fx.network.wireless_is_enabled());
    assert_eq!(fx.location.sample_count(), 1);
    server.verify().await;
}

#[tokio::test]
async fn lock_without_admin_is_acknowledged_but_not_executed() {
    let server = MockServer::start().await;
    mount_commands(&server, json!([{ "id": "7", "type": "LOCK_DEVICE" }])).await;
    mount_ack(&server, 1).await;

    let fx = Fixture {
        admin: Arc::new(MockAdmin::new()),
        ..Fixture::new(enrolled_store())
    };
    fx.poller(client_for(&server.uri())).poll_once().await;

    assert_eq!(fx.admin.lock_count(), 0);
    assert!(fx.notifier.saw("admin required"));
    server.verify().await;
}

#[tokio::test]
async fn unknown_command_type_is_acknowledged_and_ignored() {
    let server = MockServer::start().await;
    mount_commands(&server, json!([{ "id": "9", "type": "REBOOT_DEVICE" }])).await;
    Mock::given(method("POST"))
        .and(path("/acknowledge-command"))
        .and(body_partial_json(json!({
            "commandId": "9",
            "deviceImei": DEVICE_ID,
            "status": "processed",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fx = Fixture::new(enrolled_store());
    fx.poller(client_for(&server.uri())).poll_once().await;

    assert!(fx.notifier.messages().is_empty());
    server.verify().await;
}

#[tokio::test]
async fn redelivered_command_is_harmless() {
    let server = MockServer::start().await;
    mount_commands(&server, json!([{ "id": "12", "type": "DISABLE_WIFI" }])).await;
    mount_ack(&server, 2).await;

    let fx = Fixture::new(enrolled_store());
    let poller = fx.poller(client_for(&server.uri()));

    // Same command delivered on two consecutive cycles, as happens when
    // the first acknowledgment is lost server-side.
    poller.poll_once().await;
    poller.poll_once().await;

    assert!(!fx.network.wireless_is_enabled());
    assert!(fx.notifier.saw("Wireless disabled"));
    assert!(fx.notifier.saw("Wireless already disabled"));
    server.verify().await;
}

#[tokio::test]
async fn failed_acknowledgment_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    mount_commands(
        &server,
        json!([
            { "id": "1", "type": "REQUEST_LOCATION" },
            { "id": "2", "type": "REQUEST_LOCATION" },
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/acknowledge-command"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let fx = Fixture::new(enrolled_store());
    fx.poller(client_for(&server.uri())).poll_once().await;

    // Both commands still executed despite every ack being rejected.
    assert_eq!(fx.location.sample_count(), 2);
    server.verify().await;
}

// ── Loop lifecycle ──

#[tokio::test]
async fn run_stops_on_shutdown_signal() {
    let fx = Fixture::new(store());
    let poller = fx.poller(unreachable_client());
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        poller.run(rx).await;
    });

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop did not stop after shutdown signal")
        .unwrap();
}

#[tokio::test]
async fn run_stops_when_shutdown_sender_is_dropped() {
    let fx = Fixture::new(store());
    let poller = fx.poller(unreachable_client());
    let (tx, rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        poller.run(rx).await;
    });

    drop(tx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop did not stop after sender drop")
        .unwrap();
}
