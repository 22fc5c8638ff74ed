//! Relay daemon client

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{DesiredState, SetPinRequest, SignalId};
use crate::RelayError;

/// Default timeout for relay commands
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Relay client configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL of the relay daemon (e.g. "http://10.206.110.252:5000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Re-send attempts after a failed command
    pub max_retries: u32,
    /// Retry backoff base in milliseconds, doubled per attempt
    pub retry_backoff_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: 2,
            retry_backoff_ms: 100,
        }
    }
}

/// Client for the GPIO relay daemon.
///
/// Commands are write-only: the client pushes full desired states and never
/// queries the daemon's pin state back. Mock mode records every command and
/// folds it into a cumulative pin map so tests can observe both the command
/// sequence and the resulting hardware state.
pub struct RelayClient {
    config: RelayConfig,
    client: reqwest::Client,
    mock_mode: bool,
    sent: Vec<DesiredState>,
    mock_pins: BTreeMap<SignalId, bool>,
    mock_failures: u32,
}

impl RelayClient {
    /// Create a client for a real relay daemon
    pub fn new(config: RelayConfig) -> Self {
        info!("Creating relay client for {}", config.base_url);
        Self {
            config,
            client: reqwest::Client::new(),
            mock_mode: false,
            sent: Vec::new(),
            mock_pins: BTreeMap::new(),
            mock_failures: 0,
        }
    }

    /// Create a mock relay client for testing (no daemon required)
    pub fn mock() -> Self {
        debug!("Creating mock relay client");
        Self {
            config: RelayConfig {
                retry_backoff_ms: 1,
                ..RelayConfig::default()
            },
            client: reqwest::Client::new(),
            mock_mode: true,
            sent: Vec::new(),
            mock_pins: BTreeMap::new(),
            mock_failures: 0,
        }
    }

    /// Mock only: make the next `n` sends fail with a transport error
    pub fn fail_next(&mut self, n: u32) {
        self.mock_failures = n;
    }

    /// Apply a full desired state on the daemon.
    ///
    /// Retries up to `max_retries` times with doubling backoff before giving
    /// up with `RelayError::Unreachable`.
    pub async fn apply(&mut self, state: &DesiredState) -> Result<(), RelayError> {
        let attempts = self.config.max_retries + 1;
        for attempt in 0..attempts {
            match self.send_once(state).await {
                Ok(()) => {
                    debug!(pins = state.len(), attempt, "relay command applied");
                    return Ok(());
                }
                Err(e) if attempt + 1 < attempts => {
                    let backoff = self.config.retry_backoff_ms << attempt;
                    warn!(attempt, backoff_ms = backoff, "relay command failed: {e}");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    warn!("relay command failed on final attempt: {e}");
                    return Err(RelayError::Unreachable { attempts });
                }
            }
        }
        unreachable!("attempts is always at least 1")
    }

    async fn send_once(&mut self, state: &DesiredState) -> Result<(), RelayError> {
        if self.mock_mode {
            if self.mock_failures > 0 {
                self.mock_failures -= 1;
                return Err(RelayError::Transport("injected failure".into()));
            }
            self.sent.push(state.clone());
            for (id, on) in state.iter() {
                self.mock_pins.insert(id, on);
            }
            return Ok(());
        }

        let url = format!("{}/set_pin", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(&SetPinRequest { pins: state })
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Commands delivered so far (mock mode)
    pub fn commands(&self) -> &[DesiredState] {
        &self.sent
    }

    /// Cumulative pin state after all delivered commands (mock mode)
    pub fn pin_state(&self, id: SignalId) -> Option<bool> {
        self.mock_pins.get(&id).copied()
    }

    /// Drop the recorded command log (mock mode)
    pub fn clear_commands(&mut self) {
        self.sent.clear();
    }
}
