//! Supervised liveness ticker

use crate::config::MonitorConfig;
use crate::error::DaemonResult;
use crate::service::DetectionService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

/// One liveness evaluation cycle.
#[async_trait]
pub trait LivenessCheck: Send + Sync + 'static {
    async fn check(&self) -> DaemonResult<()>;
}

#[async_trait]
impl LivenessCheck for DetectionService {
    async fn check(&self) -> DaemonResult<()> {
        self.check_connection(Utc::now()).await.map(|_| ())
    }
}

/// Periodic liveness evaluation with a per-cycle recovery policy.
///
/// A failed cycle is logged and followed by a backoff. A panicking cycle
/// kills only the worker task; the supervisor respawns it after the same
/// backoff. The ticker runs for the lifetime of the process.
pub struct LivenessTicker<C: LivenessCheck> {
    check: Arc<C>,
    period: Duration,
    backoff: Duration,
}

impl<C: LivenessCheck> LivenessTicker<C> {
    pub fn new(check: Arc<C>, config: &MonitorConfig) -> Self {
        Self::with_timing(check, config.check_interval(), config.failure_backoff())
    }

    pub fn with_timing(check: Arc<C>, period: Duration, backoff: Duration) -> Self {
        Self {
            check,
            period,
            backoff,
        }
    }

    /// Start the supervisor in the background.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.supervise())
    }

    async fn supervise(self) {
        tracing::info!(
            period_secs = self.period.as_secs_f64(),
            backoff_secs = self.backoff.as_secs_f64(),
            "Liveness ticker started"
        );

        loop {
            let worker = tokio::spawn(run_cycles(
                Arc::clone(&self.check),
                self.period,
                self.backoff,
            ));

            match worker.await {
                Err(e) if e.is_panic() => {
                    tracing::error!("Liveness worker panicked, restarting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Liveness worker aborted, restarting");
                }
                Ok(()) => {
                    tracing::warn!("Liveness worker exited, restarting");
                }
            }

            sleep(self.backoff).await;
        }
    }
}

async fn run_cycles<C: LivenessCheck>(check: Arc<C>, period: Duration, backoff: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let Err(e) = check.check().await {
            tracing::error!(error = %e, "Liveness check failed");
            sleep(backoff).await;
        }
    }
}
