//! Count source implementations

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use crate::counts::RegionCounts;
use crate::DetectionError;

/// Default timeout for count queries
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// A source of per-region vehicle counts.
///
/// Each poll is an independent query returning a fresh snapshot; callers must
/// not assume any carry-over between calls.
pub trait CountSource {
    fn poll(&mut self) -> impl std::future::Future<Output = Result<RegionCounts, DetectionError>>;
}

/// Count source backed by the relay daemon's count endpoint.
///
/// The detector process pushes counts to the daemon; this client polls
/// `GET {base}/get_counts` and decodes the region -> count JSON map.
pub struct HttpCountSource {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpCountSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Decode the daemon's count payload
    fn decode(body: &str) -> Result<RegionCounts, DetectionError> {
        serde_json::from_str(body).map_err(|e| DetectionError::Decode(e.to_string()))
    }

    async fn query(&self) -> Result<RegionCounts, DetectionError> {
        let url = format!("{}/get_counts", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DetectionError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DetectionError::Unavailable(format!(
                "count endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DetectionError::Unavailable(e.to_string()))?;
        Self::decode(&body)
    }
}

impl CountSource for HttpCountSource {
    async fn poll(&mut self) -> Result<RegionCounts, DetectionError> {
        let counts = self.query().await?;
        debug!(total = counts.total(), "count snapshot");
        Ok(counts)
    }
}

/// Scripted count source for tests: replays queued poll outcomes in order,
/// then keeps returning empty snapshots.
pub struct ScriptedCounts {
    script: VecDeque<Result<RegionCounts, DetectionError>>,
    polls: usize,
}

impl ScriptedCounts {
    pub fn new(snapshots: Vec<RegionCounts>) -> Self {
        Self {
            script: snapshots.into_iter().map(Ok).collect(),
            polls: 0,
        }
    }

    /// Queue a failed poll
    pub fn push_unavailable(&mut self, reason: &str) {
        self.script
            .push_back(Err(DetectionError::Unavailable(reason.into())));
    }

    pub fn push(&mut self, counts: RegionCounts) {
        self.script.push_back(Ok(counts));
    }

    /// Number of polls served so far
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl CountSource for ScriptedCounts {
    async fn poll(&mut self) -> Result<RegionCounts, DetectionError> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(outcome) => outcome,
            None => Ok(RegionCounts::new()),
        }
    }
}
