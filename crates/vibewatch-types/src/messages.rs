//! Live-feed messages
//!
//! Every message pushed to observers shares the envelope
//! `{"type": <kind>, "payload": {...}}`. Keep-alive messages carry no payload.

use crate::connection::{ConnectionEvent, DisconnectEvent, ReconnectEvent};
use crate::prediction::{PredictionResult, StatusSnapshot};
use crate::sample::Sample;
use crate::sanitize::Sanitize;
use serde::{Deserialize, Serialize};

/// Default number of samples returned for a `get_samples` request.
pub const DEFAULT_FEED_SAMPLES_LIMIT: usize = 100;

/// Messages sent from the server to live-feed observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiveMessage {
    /// Initial snapshot sent when an observer attaches
    Connected(ConnectedPayload),

    /// A batch was scored
    Prediction(PredictionPayload),

    /// The sensor feed stalled
    SensorDisconnected(DisconnectNotice),

    /// The sensor feed resumed
    SensorReconnected(ReconnectNotice),

    /// Reply to `get_state`
    State(StatePayload),

    /// Reply to `get_samples`
    Samples(SamplesPayload),

    /// Server keep-alive
    Ping,

    /// Reply to a client `ping`
    Pong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub status: StatusSnapshot,
    pub samples_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    pub status: StatusSnapshot,
    pub samples_count: usize,
    pub result: PredictionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectNotice {
    pub message: String,
    #[serde(flatten)]
    pub event: DisconnectEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectNotice {
    pub message: String,
    #[serde(flatten)]
    pub event: ReconnectEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    pub status: StatusSnapshot,
    pub samples_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplesPayload {
    pub samples: Vec<Sample>,
}

impl LiveMessage {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LiveMessage::Connected(_) => "connected",
            LiveMessage::Prediction(_) => "prediction",
            LiveMessage::SensorDisconnected(_) => "sensor_disconnected",
            LiveMessage::SensorReconnected(_) => "sensor_reconnected",
            LiveMessage::State(_) => "state",
            LiveMessage::Samples(_) => "samples",
            LiveMessage::Ping => "ping",
            LiveMessage::Pong => "pong",
        }
    }
}

impl From<ConnectionEvent> for LiveMessage {
    fn from(event: ConnectionEvent) -> Self {
        let message = event.message();
        match event {
            ConnectionEvent::Disconnected(event) => {
                LiveMessage::SensorDisconnected(DisconnectNotice { message, event })
            }
            ConnectionEvent::Reconnected(event) => {
                LiveMessage::SensorReconnected(ReconnectNotice { message, event })
            }
        }
    }
}

impl Sanitize for LiveMessage {
    fn sanitize(&mut self) {
        match self {
            LiveMessage::Connected(p) => p.status.sanitize(),
            LiveMessage::Prediction(p) => {
                p.status.sanitize();
                p.result.sanitize();
            }
            LiveMessage::SensorDisconnected(n) => n.event.sanitize(),
            LiveMessage::SensorReconnected(n) => n.event.sanitize(),
            LiveMessage::State(p) => p.status.sanitize(),
            LiveMessage::Samples(p) => p.samples.sanitize(),
            LiveMessage::Ping | LiveMessage::Pong => {}
        }
    }
}

/// Requests accepted from persistent-feed observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Ping,
    GetState,
    GetSamples {
        #[serde(default = "default_feed_samples_limit")]
        limit: usize,
    },
}

fn default_feed_samples_limit() -> usize {
    DEFAULT_FEED_SAMPLES_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_envelope_shape() {
        let msg = LiveMessage::State(StatePayload {
            status: StatusSnapshot::default(),
            samples_count: 4,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["payload"]["samples_count"], 4);
        assert_eq!(json["payload"]["status"]["status_color"], "green");
    }

    #[test]
    fn test_keepalive_has_no_payload() {
        let json = serde_json::to_string(&LiveMessage::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
        assert_eq!(LiveMessage::Pong.kind(), "pong");
    }

    #[test]
    fn test_connection_event_conversion() {
        let msg: LiveMessage = ConnectionEvent::Disconnected(DisconnectEvent {
            disconnect_time: Utc::now(),
            seconds_since_last_data: f64::INFINITY,
            total_disconnections: 2,
        })
        .into();
        assert_eq!(msg.kind(), "sensor_disconnected");

        let json = serde_json::to_value(msg.sanitized()).unwrap();
        assert_eq!(json["payload"]["total_disconnections"], 2);
        assert_eq!(json["payload"]["seconds_since_last_data"], 1e10);
        assert!(json["payload"]["message"].is_string());
    }

    #[test]
    fn test_samples_payload_sanitized() {
        let msg = LiveMessage::Samples(SamplesPayload {
            samples: vec![Sample::new(1, [f64::NAN, 0.5, f64::NEG_INFINITY])],
        })
        .sanitized();
        let LiveMessage::Samples(payload) = msg else {
            panic!("expected samples");
        };
        assert_eq!(payload.samples[0].axes(), [0.0, 0.5, -1e10]);
    }

    #[test]
    fn test_client_requests() {
        let ping: ClientRequest = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientRequest::Ping);

        let samples: ClientRequest = serde_json::from_str(r#"{"type":"get_samples"}"#).unwrap();
        assert_eq!(samples, ClientRequest::GetSamples { limit: 100 });

        let samples: ClientRequest =
            serde_json::from_str(r#"{"type":"get_samples","limit":5}"#).unwrap();
        assert_eq!(samples, ClientRequest::GetSamples { limit: 5 });

        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"reboot"}"#).is_err());
    }
}
