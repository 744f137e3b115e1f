//! Per-target state estimation and the default association policy

pub mod kalman;
pub mod manager;

pub use kalman::{PositionTracker, TrackState};
pub use manager::{target_measurement, TrackManager, TrackSnapshot};
