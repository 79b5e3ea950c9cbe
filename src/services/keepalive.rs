//! Periodic self-ping that keeps idle hosted deployments awake
//!
//! Runs on its own task, isolated from request handling. Failures are logged
//! at debug level and otherwise ignored.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::utils::url::UrlUtils;
use crate::utils::{FetchRequest, RemoteFetcher};

pub struct KeepaliveService {
    fetcher: RemoteFetcher,
    target: String,
    period: Duration,
}

impl KeepaliveService {
    /// `self_url` is the deployment's public base URL; `/health` is appended
    pub fn new(fetcher: RemoteFetcher, self_url: &str, period: Duration) -> Self {
        Self {
            fetcher,
            target: health_url(self_url),
            period,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Spawn the timer. The first ping happens one full period after start.
    pub fn spawn(self, cancellation: CancellationToken) -> JoinHandle<()> {
        info!(
            target_url = %UrlUtils::obfuscate_credentials(&self.target),
            period = %humantime::format_duration(self.period),
            "Starting keepalive"
        );

        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancellation.cancelled() => {
                        debug!("Keepalive stopped");
                        break;
                    }
                    _ = ticker.tick() => self.ping().await,
                }
            }
        })
    }

    async fn ping(&self) {
        match self.fetcher.send(FetchRequest::page(&self.target)).await {
            Ok(response) => debug!(status = response.status().as_u16(), "Keepalive ping"),
            Err(e) => debug!(error = %e, "Keepalive ping failed"),
        }
    }
}

fn health_url(self_url: &str) -> String {
    format!("{}/health", self_url.trim().trim_end_matches('/'))
}
