//! presence-radar-core: real-time FMCW radar processing for human presence sensing
//!
//! Turns raw complex IQ frames into a Range-Doppler power map, finds
//! statistically significant returns with 2-D CA-CFAR, groups them into
//! targets and tracks each target with a constant-velocity Kalman filter.
//!
//! - Spectral processing with windowed range and Doppler FFTs
//! - CA-CFAR over strip-summed training rings, parallel across range bins
//! - Greedy detection clustering and per-target tracking
//! - Layered TOML / environment configuration
//! - Frame source abstraction with a synthetic scene simulator
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use presence_radar_core::config::SystemConfig;
//! use presence_radar_core::hal::{SceneSimulator, SimulatorConfig};
//! use presence_radar_core::processing::FramePipeline;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SystemConfig::default();
//!     let mut simulator = SceneSimulator::demo_scene(config.radar_config()?, SimulatorConfig::default())?;
//!     let mut pipeline = FramePipeline::new(config)?;
//!     let mut state = pipeline.new_state();
//!
//!     for _ in 0..10 {
//!         let frame = simulator.generate_frame()?;
//!         let output = pipeline.process_frame(&frame, &mut state)?;
//!         println!("{} targets, {} tracks", output.targets.len(), output.tracks.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod hal;
pub mod processing;
pub mod tracking;
pub mod utils;

#[cfg(feature = "service")]
pub mod service;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, RadarConfig, RadarSettings, SystemConfig};
pub use error::{ProcessingStage, RadarError, RadarResult};
pub use hal::{FrameSource, SceneSimulator, SimulatedTarget, SimulatorConfig};
pub use processing::{
    CfarDetector, Cluster, Detection, DetectionClusterer, FrameOutput, FramePipeline, PhysicalTarget,
    PipelineState, RangeDopplerMap, RawFrame, SpectralProcessor,
};
pub use tracking::{PositionTracker, TrackManager, TrackSnapshot, TrackState};

pub use utils::{
    time::{current_timestamp_nanos, TimeProvider},
    validation::{ValidationError, ValidationResult},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Real-time FMCW radar processing core for human presence sensing".to_string(),
        features: vec![
            "Range-Doppler processing".to_string(),
            "2-D CA-CFAR detection".to_string(),
            "Detection clustering".to_string(),
            "Kalman target tracking".to_string(),
            "Layered configuration".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub features: Vec<String>,
}
