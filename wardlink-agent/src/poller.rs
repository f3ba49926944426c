//! Remote command loop.
//!
//! A single background worker on a sleep-then-poll cycle: fetch pending
//! commands, execute each in order, acknowledge every attempt. The loop
//! favors availability over timeliness: transport failures skip the cycle
//! and the next tick tries again, with no backoff escalation. Cycles never
//! overlap; the interval is measured from cycle start to cycle start.

use crate::api::ManagementClient;
use crate::error::AgentError;
use crate::executor::CommandExecutor;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wardlink_store::{keys, Store};

/// The remote command polling loop.
pub struct CommandPoller {
    store: Store,
    client: ManagementClient,
    device_identity: String,
    executor: CommandExecutor,
    interval: Duration,
}

impl CommandPoller {
    pub fn new(
        store: Store,
        client: ManagementClient,
        device_identity: impl Into<String>,
        executor: CommandExecutor,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            client,
            device_identity: device_identity.into(),
            executor,
            interval,
        }
    }

    /// Runs until the shutdown channel signals `true` (or its sender is
    /// dropped). Safe to start before enrollment completes: cycles no-op
    /// until `workflow_completed` is set.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // Delay keeps cycle starts evenly spaced and prevents tick bursts
        // after a long poll; ticks never overlap a running cycle.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Command loop started (interval {:?})", self.interval);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Command loop stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// Executes one poll cycle.
    pub async fn poll_once(&self) {
        match self.store.get_bool(keys::WORKFLOW_COMPLETED) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Enrollment incomplete, skipping poll cycle");
                return;
            }
            Err(e) => {
                warn!("Failed to read enrollment state: {e}");
                return;
            }
        }

        let commands = match self.client.check_commands(&self.device_identity).await {
            Ok(commands) => commands,
            Err(AgentError::Transport(e)) => {
                warn!("Command check unreachable, retrying next cycle: {e}");
                return;
            }
            Err(e) => {
                warn!("Command check failed, retrying next cycle: {e}");
                return;
            }
        };

        if commands.is_empty() {
            return;
        }
        info!("Processing {} command(s)", commands.len());

        for command in &commands {
            self.executor.execute(command);

            // One acknowledgment attempt per command per cycle; a lost ack
            // means the server redelivers, which every handler tolerates.
            if let Err(e) = self
                .client
                .acknowledge_command(&command.id, &self.device_identity)
                .await
            {
                warn!("Failed to acknowledge command {}: {e}", command.id);
            }
        }
    }
}
