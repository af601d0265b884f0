//! Sensor connection state and transition events

use crate::sanitize::Sanitize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness phase of the sensor feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// No data has ever been received
    #[default]
    NeverConnected,
    /// Data arrived within the timeout
    Connected,
    /// Feed stalled past the timeout
    Disconnected,
}

/// Mutable connection bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub last_data_time: Option<DateTime<Utc>>,
    pub disconnect_time: Option<DateTime<Utc>>,
    pub connection_start_time: Option<DateTime<Utc>>,
    pub total_disconnections: u64,
}

impl ConnectionState {
    pub fn connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }
}

/// Emitted when a connected feed exceeds the timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectEvent {
    pub disconnect_time: DateTime<Utc>,
    pub seconds_since_last_data: f64,
    pub total_disconnections: u64,
}

/// Emitted when a disconnected feed delivers data again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectEvent {
    pub reconnect_time: DateTime<Utc>,
    pub downtime_seconds: f64,
}

/// Connection state transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionEvent {
    Disconnected(DisconnectEvent),
    Reconnected(ReconnectEvent),
}

impl ConnectionEvent {
    /// Human-readable summary for observers.
    pub fn message(&self) -> String {
        match self {
            ConnectionEvent::Disconnected(e) => format!(
                "Sensor disconnected: no data for {:.1}s",
                e.seconds_since_last_data
            ),
            ConnectionEvent::Reconnected(e) => format!(
                "Sensor reconnected after {:.1}s offline",
                e.downtime_seconds
            ),
        }
    }
}

/// Connection report served by the sensor status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatusReport {
    pub connected: bool,
    pub phase: ConnectionPhase,
    pub last_data_time: Option<DateTime<Utc>>,
    pub disconnect_time: Option<DateTime<Utc>>,
    pub connection_start_time: Option<DateTime<Utc>>,
    pub total_disconnections: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_since_last_data: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
}

impl SensorStatusReport {
    /// Build a report from the state as observed at `now`.
    pub fn from_state(state: &ConnectionState, now: DateTime<Utc>) -> Self {
        let seconds_since = |t: DateTime<Utc>| (now - t).num_milliseconds() as f64 / 1000.0;

        Self {
            connected: state.connected(),
            phase: state.phase,
            last_data_time: state.last_data_time,
            disconnect_time: state.disconnect_time,
            connection_start_time: state.connection_start_time,
            total_disconnections: state.total_disconnections,
            seconds_since_last_data: state.last_data_time.map(seconds_since),
            uptime_seconds: state
                .connection_start_time
                .filter(|_| state.connected())
                .map(seconds_since),
        }
    }
}

impl Sanitize for DisconnectEvent {
    fn sanitize(&mut self) {
        self.seconds_since_last_data.sanitize();
    }
}

impl Sanitize for ReconnectEvent {
    fn sanitize(&mut self) {
        self.downtime_seconds.sanitize();
    }
}

impl Sanitize for ConnectionEvent {
    fn sanitize(&mut self) {
        match self {
            ConnectionEvent::Disconnected(e) => e.sanitize(),
            ConnectionEvent::Reconnected(e) => e.sanitize(),
        }
    }
}

impl Sanitize for SensorStatusReport {
    fn sanitize(&mut self) {
        self.seconds_since_last_data.sanitize();
        self.uptime_seconds.sanitize();
    }
}
