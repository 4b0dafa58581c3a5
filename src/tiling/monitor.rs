use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::status::{AssetStatusResponse, TilingStatus};
use crate::assets::AssetId;
use crate::auth::AccessToken;
use crate::config::{IonConfig, MIN_POLL_INTERVAL};

/// Why monitoring ended without a tiled asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorFailure {
    #[error("could not retrieve tiling status: {0}")]
    Transport(String),
    #[error("tiling failed with status {0}")]
    Tiling(String),
}

/// Terminal result of monitoring one asset.
pub type TilingOutcome = Result<AssetId, MonitorFailure>;

/// Result of a single [`TilingMonitor::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Progress {
        percent_complete: f64,
    },
    /// `percent_complete` is set when the final status carried one (tiling completed).
    Finished {
        outcome: TilingOutcome,
        percent_complete: Option<f64>,
    },
}

/// Polling state machine for one tiling job.
///
/// Each [`tick`](Self::tick) issues one status request until a terminal state
/// is reached; after that, ticks return the stored outcome without touching
/// the network. Cancelling is simply not calling `tick` again, or
/// [`MonitorHandle::cancel`] when driven by [`start`](Self::start).
pub struct TilingMonitor {
    config: Arc<IonConfig>,
    client: reqwest::Client,
    asset_id: AssetId,
    token: AccessToken,
    outcome: Option<TilingOutcome>,
    requests: u64,
}

impl TilingMonitor {
    pub fn new(config: Arc<IonConfig>, asset_id: AssetId, token: AccessToken) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            asset_id,
            token,
            outcome: None,
            requests: 0,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn outcome(&self) -> Option<&TilingOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Number of status requests issued so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub async fn tick(&mut self) -> TickOutcome {
        if let Some(outcome) = &self.outcome {
            return TickOutcome::Finished {
                outcome: outcome.clone(),
                percent_complete: None,
            };
        }

        let response = match self.fetch_status().await {
            Ok(response) => response,
            Err(message) => {
                warn!(asset_id = %self.asset_id, %message, "tiling status unavailable");
                return self.finish(Err(MonitorFailure::Transport(message)), None);
            }
        };

        match TilingStatus::from(&response) {
            TilingStatus::InProgress {
                status,
                percent_complete,
            } => {
                debug!(asset_id = %self.asset_id, %status, percent_complete, "tiling in progress");
                TickOutcome::Progress { percent_complete }
            }
            TilingStatus::Complete { percent_complete } => {
                info!(asset_id = %self.asset_id, "tiling complete");
                self.finish(Ok(self.asset_id), Some(percent_complete))
            }
            TilingStatus::Failed { status } => {
                warn!(asset_id = %self.asset_id, %status, "tiling failed");
                self.finish(Err(MonitorFailure::Tiling(status)), None)
            }
        }
    }

    fn finish(&mut self, outcome: TilingOutcome, percent_complete: Option<f64>) -> TickOutcome {
        self.outcome = Some(outcome.clone());
        TickOutcome::Finished {
            outcome,
            percent_complete,
        }
    }

    async fn fetch_status(&mut self) -> Result<AssetStatusResponse, String> {
        self.requests += 1;
        let resp = self
            .client
            .get(self.config.asset_endpoint(self.asset_id))
            .query(&[("access_token", self.token.secret())])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if resp.status() != StatusCode::OK {
            return Err(format!("status endpoint returned {}", resp.status()));
        }
        let body = resp.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str(&body).map_err(|e| format!("unexpected status response: {e}"))
    }

    /// Tick on the configured interval in a background task.
    ///
    /// `on_progress` receives every percent-complete reading, including the
    /// final one on success; `on_terminal` runs exactly once unless the
    /// handle is cancelled or dropped first.
    pub fn start<P, T>(mut self, mut on_progress: P, on_terminal: T) -> MonitorHandle
    where
        P: FnMut(f64) + Send + 'static,
        T: FnOnce(TilingOutcome) + Send + 'static,
    {
        let period = self.config.status_poll_interval.max(MIN_POLL_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.tick().await {
                    TickOutcome::Progress { percent_complete } => on_progress(percent_complete),
                    TickOutcome::Finished {
                        outcome,
                        percent_complete,
                    } => {
                        if let Some(percent) = percent_complete {
                            on_progress(percent);
                        }
                        on_terminal(outcome.clone());
                        return outcome;
                    }
                }
            }
        });
        MonitorHandle { task }
    }
}

/// Handle to a monitor driven by [`TilingMonitor::start`].
///
/// Dropping the handle stops the monitor, the same as [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<TilingOutcome>,
}

impl MonitorHandle {
    /// Stop ticking. A request already in flight is dropped with the task.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome; `None` if the monitor was cancelled.
    ///
    /// Dropping this future before it resolves also stops the monitor.
    pub async fn wait(mut self) -> Option<TilingOutcome> {
        (&mut self.task).await.ok()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
