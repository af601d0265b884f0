//! Detection service
//!
//! Owns every piece of shared mutable state of the daemon: the detector with
//! its decision history, the recent-sample buffer, the latest status
//! snapshot, the connection monitor and the broadcaster. Handlers and the
//! liveness ticker only reach that state through this type.

use crate::broadcast::Broadcaster;
use crate::error::DaemonResult;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use vibewatch_detect::{
    timestamp_rows, validate_batch, AnomalyDetector, ConnectionMonitor, DetectResult, SampleBuffer,
};
use vibewatch_types::{
    ConnectedPayload, ConnectionEvent, LiveMessage, PredictionPayload, PredictionResult, Sample,
    Sanitize, SensorBatch, SensorStatusReport, StatePayload, StatusSnapshot,
};

/// Message sent to a persistent observer when it attaches.
const WELCOME_MESSAGE: &str = "Connected to the vibewatch anomaly server";

/// Service state shared by the API and the liveness ticker
pub struct DetectionService {
    detector: AnomalyDetector,
    buffer: RwLock<SampleBuffer>,
    latest: RwLock<StatusSnapshot>,
    monitor: Mutex<ConnectionMonitor>,
    broadcaster: Arc<Broadcaster>,
    /// Held from prediction until its messages are delivered, so the latest
    /// snapshot and the live feed follow prediction order
    pipeline: AsyncMutex<()>,
}

impl DetectionService {
    pub fn new(
        detector: AnomalyDetector,
        buffer_capacity: usize,
        monitor: ConnectionMonitor,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        let latest = StatusSnapshot {
            threshold: detector.threshold(),
            ..StatusSnapshot::default()
        };

        Self {
            detector,
            buffer: RwLock::new(SampleBuffer::new(buffer_capacity)),
            latest: RwLock::new(latest.sanitized()),
            monitor: Mutex::new(monitor),
            broadcaster,
            pipeline: AsyncMutex::new(()),
        }
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn threshold(&self) -> f64 {
        self.detector.threshold()
    }

    /// Validate, score and record one batch, then notify observers.
    ///
    /// A batch that fails validation leaves every piece of state untouched.
    /// The returned result is sanitized.
    pub async fn ingest(&self, batch: SensorBatch) -> DetectResult<PredictionResult> {
        let rows = validate_batch(&batch)?;

        let _pipeline = self.pipeline.lock().await;
        let result = self.detector.predict(&rows)?.sanitized();

        let now = Utc::now();
        let samples_count = {
            let mut buffer = self.buffer.write();
            buffer.extend(timestamp_rows(&rows, now.timestamp_millis()));
            buffer.len()
        };
        let event = self.monitor.lock().record_data(now);

        let status = StatusSnapshot::from_prediction(&result);
        *self.latest.write() = status.clone();

        tracing::info!(
            sensor_id = %batch.sensor_id,
            samples = rows.len(),
            distance = result.distance,
            threshold = result.threshold,
            is_anomaly = result.is_anomaly,
            confidence = result.confidence,
            "Prediction"
        );
        tracing::debug!(features = ?result.feature_values, "Per-axis features");

        if let Some(event) = event {
            self.notify(event.into()).await;
        }
        self.notify(LiveMessage::Prediction(PredictionPayload {
            status,
            samples_count,
            result: result.clone(),
        }))
        .await;

        Ok(result)
    }

    /// Re-evaluate sensor liveness at `now` and broadcast any transition.
    pub async fn check_connection(
        &self,
        now: DateTime<Utc>,
    ) -> DaemonResult<Option<ConnectionEvent>> {
        let _pipeline = self.pipeline.lock().await;
        let event = self.monitor.lock().evaluate(now);
        if let Some(event) = &event {
            self.broadcaster.broadcast(event.clone().into()).await?;
        }
        Ok(event)
    }

    /// Latest status snapshot, always finite.
    pub fn latest_status(&self) -> StatusSnapshot {
        self.latest.read().clone()
    }

    /// Up to `limit` most recent samples, oldest first.
    pub fn recent_samples(&self, limit: usize) -> Vec<Sample> {
        self.buffer.read().recent(limit).sanitized()
    }

    pub fn samples_count(&self) -> usize {
        self.buffer.read().len()
    }

    pub fn sensor_status(&self) -> SensorStatusReport {
        self.monitor.lock().report(Utc::now()).sanitized()
    }

    /// Snapshot sent to a persistent observer on attach.
    pub fn connected_message(&self) -> LiveMessage {
        LiveMessage::Connected(ConnectedPayload {
            status: self.latest_status(),
            samples_count: self.samples_count(),
            message: WELCOME_MESSAGE.to_string(),
        })
    }

    /// Reply to a `get_state` request.
    pub fn state_message(&self) -> LiveMessage {
        LiveMessage::State(StatePayload {
            status: self.latest_status(),
            samples_count: self.samples_count(),
        })
    }

    async fn notify(&self, message: LiveMessage) {
        if let Err(e) = self.broadcaster.broadcast(message).await {
            tracing::error!(error = %e, "Failed to broadcast live message");
        }
    }
}
