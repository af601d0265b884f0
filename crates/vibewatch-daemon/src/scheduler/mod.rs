//! Background tasks
//!
//! The liveness ticker re-evaluates the sensor connection on a fixed period,
//! independent of ingestion traffic, so a stalled feed is noticed even when
//! no data arrives at all.

mod liveness;

pub use liveness::{LivenessCheck, LivenessTicker};
