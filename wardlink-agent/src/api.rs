//! Management server client.
//!
//! Thin JSON request/response wrapper over the server's device API. Every
//! method maps connection failures to [`AgentError::Transport`] and
//! non-2xx or unparseable responses to [`AgentError::Server`], so callers
//! can distinguish "retry next cycle" from "surface to the user".

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wardlink_types::Command;

/// Client for the Wardlink management server device endpoints.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodeRequest<'a> {
    parent_code: &'a str,
    device_imei: &'a str,
}

#[derive(Deserialize)]
struct VerifyCodeResponse {
    valid: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyCodesRequest<'a> {
    parent_code: &'a str,
    secret_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveSecretCodeRequest<'a> {
    parent_code: &'a str,
    device_imei: &'a str,
    secret_code: &'a str,
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDeviceRequest<'a> {
    parent_code: &'a str,
    device_imei: &'a str,
    device_info: serde_json::Value,
}

#[derive(Deserialize)]
struct RegisterDeviceResponse {
    success: bool,
    message: Option<String>,
}

/// Result of a device registration attempt.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct CommandBatchResponse {
    #[serde(default)]
    commands: Vec<Command>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest<'a> {
    command_id: &'a str,
    device_imei: &'a str,
    status: &'a str,
    timestamp: i64,
}

impl ManagementClient {
    /// Creates a client with the configured base URL and timeouts.
    pub fn new(config: &AgentConfig) -> AgentResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| AgentError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verifies the parent code for this device.
    /// `POST verify-code {parentCode, deviceImei}` → `{valid}`.
    pub async fn verify_code(
        &self,
        parent_code: &str,
        device_identity: &str,
    ) -> AgentResult<bool> {
        let body = VerifyCodeRequest {
            parent_code,
            device_imei: device_identity,
        };
        let response: VerifyCodeResponse = self.post_json("verify-code", &body).await?;
        Ok(response.valid)
    }

    /// Combined parent/secret code verification variant.
    /// `POST verify-codes {parentCode, secretCode}` → `{success}`.
    pub async fn verify_codes(
        &self,
        parent_code: &str,
        secret_code: &str,
    ) -> AgentResult<bool> {
        let body = VerifyCodesRequest {
            parent_code,
            secret_code,
        };
        let response: SuccessResponse = self.post_json("verify-codes", &body).await?;
        Ok(response.success)
    }

    /// Best-effort sync of the secret code to the server.
    /// `POST save-secret-code {parentCode, deviceImei, secretCode}`.
    pub async fn save_secret_code(
        &self,
        parent_code: &str,
        device_identity: &str,
        secret_code: &str,
    ) -> AgentResult<bool> {
        let body = SaveSecretCodeRequest {
            parent_code,
            device_imei: device_identity,
            secret_code,
        };
        let response: SuccessResponse = self.post_json("save-secret-code", &body).await?;
        Ok(response.success)
    }

    /// Registers the device.
    /// `POST register-device {parentCode, deviceImei, deviceInfo}`.
    pub async fn register_device(
        &self,
        parent_code: &str,
        device_identity: &str,
        device_info: serde_json::Value,
    ) -> AgentResult<RegisterOutcome> {
        let body = RegisterDeviceRequest {
            parent_code,
            device_imei: device_identity,
            device_info,
        };
        let response: RegisterDeviceResponse = self.post_json("register-device", &body).await?;
        Ok(RegisterOutcome {
            success: response.success,
            message: response.message,
        })
    }

    /// Fetches pending commands for this device.
    /// `GET check-commands/{deviceImei}` → `{commands: [...]}`.
    pub async fn check_commands(&self, device_identity: &str) -> AgentResult<Vec<Command>> {
        let url = format!("{}/check-commands/{}", self.base_url, device_identity);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::Transport(format!("command check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::Server(format!(
                "command check failed: {}",
                response.status()
            )));
        }

        let batch: CommandBatchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Server(format!("failed to parse command batch: {e}")))?;

        debug!("Fetched {} pending command(s)", batch.commands.len());
        Ok(batch.commands)
    }

    /// Reports a command as attempted. At most one attempt per command per
    /// poll cycle; the caller logs failures and never retries.
    /// `POST acknowledge-command {commandId, deviceImei, status, timestamp}`.
    pub async fn acknowledge_command(
        &self,
        command_id: &str,
        device_identity: &str,
    ) -> AgentResult<()> {
        let body = AcknowledgeRequest {
            command_id,
            device_imei: device_identity,
            status: "processed",
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        let url = format!("{}/acknowledge-command", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Transport(format!("acknowledgment failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::Server(format!(
                "acknowledgment rejected: {}",
                response.status()
            )));
        }

        debug!("Command acknowledged: {command_id}");
        Ok(())
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AgentResult<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::Transport(format!("{endpoint} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::Server(format!(
                "{endpoint} failed: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Server(format!("failed to parse {endpoint} response: {e}")))
    }
}
