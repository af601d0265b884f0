//! Sensor liveness state machine
//!
//! ```text
//! NeverConnected --first data--> Connected <--timeout / data--> Disconnected
//! ```
//!
//! The monitor is evaluated on every ingested batch and by a periodic ticker,
//! so a stalled feed is detected even when no traffic arrives. Time is
//! always passed in, which keeps transitions deterministic under test.

use chrono::{DateTime, Duration, Utc};
use vibewatch_types::{
    ConnectionEvent, ConnectionPhase, ConnectionState, DisconnectEvent, ReconnectEvent,
    SensorStatusReport,
};

/// Connection state machine with timeout hysteresis.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    timeout: Duration,
    state: ConnectionState,
}

impl ConnectionMonitor {
    /// Create a monitor that declares the feed stalled after `timeout`
    /// without data.
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            timeout: Duration::from_std(timeout).unwrap_or_else(|_| Duration::max_value()),
            state: ConnectionState::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase
    }

    /// Record that data arrived at `now`.
    ///
    /// The first data ever received establishes the connection silently.
    /// Afterwards the state is re-evaluated, which may yield a reconnect.
    pub fn record_data(&mut self, now: DateTime<Utc>) -> Option<ConnectionEvent> {
        self.state.last_data_time = Some(now);

        if self.state.phase == ConnectionPhase::NeverConnected {
            self.state.phase = ConnectionPhase::Connected;
            self.state.connection_start_time = Some(now);
            tracing::info!("Sensor connected for the first time");
            return None;
        }

        self.evaluate(now)
    }

    /// Re-evaluate liveness at `now`, returning the transition if any.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> Option<ConnectionEvent> {
        let last_data = self.state.last_data_time?;
        let silence = now - last_data;
        let stalled = silence > self.timeout;

        match (self.state.phase, stalled) {
            (ConnectionPhase::Connected, true) => {
                self.state.phase = ConnectionPhase::Disconnected;
                self.state.disconnect_time = Some(now);
                self.state.total_disconnections += 1;

                let seconds = seconds(silence);
                tracing::warn!(
                    seconds_since_last_data = seconds,
                    total_disconnections = self.state.total_disconnections,
                    "Sensor disconnected"
                );

                Some(ConnectionEvent::Disconnected(DisconnectEvent {
                    disconnect_time: now,
                    seconds_since_last_data: seconds,
                    total_disconnections: self.state.total_disconnections,
                }))
            }
            (ConnectionPhase::Disconnected, false) => {
                self.state.phase = ConnectionPhase::Connected;
                self.state.connection_start_time = Some(now);

                let downtime = self
                    .state
                    .disconnect_time
                    .map(|t| seconds(now - t))
                    .unwrap_or(0.0);
                tracing::info!(downtime_seconds = downtime, "Sensor reconnected");

                Some(ConnectionEvent::Reconnected(ReconnectEvent {
                    reconnect_time: now,
                    downtime_seconds: downtime,
                }))
            }
            _ => None,
        }
    }

    /// Status report as observed at `now`.
    pub fn report(&self, now: DateTime<Utc>) -> SensorStatusReport {
        SensorStatusReport::from_state(&self.state, now)
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> ConnectionMonitor {
        ConnectionMonitor::new(std::time::Duration::from_secs(10))
    }

    #[test]
    fn test_first_data_connects_silently() {
        let mut monitor = monitor();
        let now = Utc::now();

        assert!(monitor.evaluate(now).is_none());
        assert_eq!(monitor.phase(), ConnectionPhase::NeverConnected);

        assert!(monitor.record_data(now).is_none());
        assert_eq!(monitor.phase(), ConnectionPhase::Connected);
        assert_eq!(monitor.state().connection_start_time, Some(now));
        assert_eq!(monitor.state().total_disconnections, 0);
    }

    #[test]
    fn test_timeout_disconnects_once() {
        let mut monitor = monitor();
        let start = Utc::now();
        monitor.record_data(start);

        let now = start + Duration::seconds(11);
        let event = monitor.evaluate(now).expect("disconnect event");
        match event {
            ConnectionEvent::Disconnected(e) => {
                assert_eq!(e.total_disconnections, 1);
                assert_eq!(e.seconds_since_last_data, 11.0);
                assert_eq!(e.disconnect_time, now);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(monitor.phase(), ConnectionPhase::Disconnected);

        // Same state on later ticks: no further events
        assert!(monitor.evaluate(now + Duration::seconds(5)).is_none());
        assert_eq!(monitor.state().total_disconnections, 1);
    }

    #[test]
    fn test_exactly_at_timeout_stays_connected() {
        let mut monitor = monitor();
        let start = Utc::now();
        monitor.record_data(start);
        assert!(monitor.evaluate(start + Duration::seconds(10)).is_none());
        assert_eq!(monitor.phase(), ConnectionPhase::Connected);
    }

    #[test]
    fn test_reconnect_reports_downtime() {
        let mut monitor = monitor();
        let start = Utc::now();
        monitor.record_data(start);

        let disconnected_at = start + Duration::seconds(11);
        monitor.evaluate(disconnected_at);

        let back = disconnected_at + Duration::seconds(30);
        match monitor.record_data(back) {
            Some(ConnectionEvent::Reconnected(e)) => {
                assert_eq!(e.downtime_seconds, 30.0);
                assert_eq!(e.reconnect_time, back);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(monitor.phase(), ConnectionPhase::Connected);
        assert_eq!(monitor.state().connection_start_time, Some(back));
        assert_eq!(monitor.state().total_disconnections, 1);
    }

    #[test]
    fn test_steady_traffic_emits_nothing() {
        let mut monitor = monitor();
        let start = Utc::now();
        for i in 0..20 {
            assert!(monitor.record_data(start + Duration::seconds(i)).is_none());
        }
        assert_eq!(monitor.state().total_disconnections, 0);
    }
}
