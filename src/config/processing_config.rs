// src/config/processing_config.rs
//! Processing-chain configuration structures

use crate::config::constants::{association, cfar, clustering, pipeline, tracking};
use crate::utils::validation::{
    validate_finite, validate_nonzero, validate_positive, validate_probability, validate_range, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Rectangular,
    Hamming,
    Hanning,
    Blackman,
}

/// Spectral processor configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpectralConfig {
    /// Taper applied along both the range and Doppler axes
    #[serde(default = "defaults::window")]
    pub window: WindowType,
}

/// Cell-averaging CFAR configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CfarConfig {
    #[serde(default = "defaults::guard_cells")]
    pub guard_cells: usize,

    #[serde(default = "defaults::training_cells")]
    pub training_cells: usize,

    /// Target probability of false alarm
    #[serde(default = "defaults::pfa")]
    pub pfa: f64,
}

/// Detection clustering configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Merge distance in (range, Doppler) bin units; strict `<` comparison
    #[serde(default = "defaults::eps")]
    pub eps: f64,
}

/// Constant-velocity Kalman tracker configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TrackerConfig {
    /// Time step between predictions (s)
    #[serde(default = "defaults::dt")]
    pub dt: f64,

    /// Diagonal of Q
    #[serde(default = "defaults::process_noise")]
    pub process_noise: f64,

    /// Diagonal of R
    #[serde(default = "defaults::measurement_noise")]
    pub measurement_noise: f64,

    /// Diagonal of the covariance a freshly initialised track starts with
    #[serde(default = "defaults::initial_covariance")]
    pub initial_covariance: f64,
}

/// Track association policy configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssociationConfig {
    /// Maximum predicted-to-measured distance for a pairing (m)
    #[serde(default = "defaults::gate_distance_m")]
    pub gate_distance_m: f64,

    /// Consecutive frames without a measurement before a track is dropped
    #[serde(default = "defaults::max_missed_frames")]
    pub max_missed_frames: u32,

    #[serde(default = "defaults::max_tracks")]
    pub max_tracks: usize,
}

/// Frame pipeline configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "defaults::enable_tracking")]
    pub enable_tracking: bool,

    #[serde(default = "defaults::latency_target_ms")]
    pub latency_target_ms: f64,

    /// Bounded queue length for each state subscriber
    #[serde(default = "defaults::subscriber_capacity")]
    pub subscriber_capacity: usize,
}

mod defaults {
    use super::WindowType;
    use crate::config::constants::*;

    pub fn window() -> WindowType { WindowType::Hamming }

    pub fn guard_cells() -> usize { cfar::DEFAULT_GUARD_CELLS }
    pub fn training_cells() -> usize { cfar::DEFAULT_TRAINING_CELLS }
    pub fn pfa() -> f64 { cfar::DEFAULT_PFA }

    pub fn eps() -> f64 { clustering::DEFAULT_EPS_BINS }

    pub fn dt() -> f64 { tracking::DEFAULT_DT_S }
    pub fn process_noise() -> f64 { tracking::DEFAULT_PROCESS_NOISE }
    pub fn measurement_noise() -> f64 { tracking::DEFAULT_MEASUREMENT_NOISE }
    pub fn initial_covariance() -> f64 { tracking::INITIAL_COVARIANCE }

    pub fn gate_distance_m() -> f64 { association::DEFAULT_GATE_DISTANCE_M }
    pub fn max_missed_frames() -> u32 { association::DEFAULT_MAX_MISSED_FRAMES }
    pub fn max_tracks() -> usize { association::DEFAULT_MAX_TRACKS }

    pub fn enable_tracking() -> bool { true }
    pub fn latency_target_ms() -> f64 { pipeline::DEFAULT_LATENCY_TARGET_MS }
    pub fn subscriber_capacity() -> usize { pipeline::DEFAULT_SUBSCRIBER_CAPACITY }
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self { window: defaults::window() }
    }
}

impl Default for CfarConfig {
    fn default() -> Self {
        Self {
            guard_cells: defaults::guard_cells(),
            training_cells: defaults::training_cells(),
            pfa: defaults::pfa(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { eps: defaults::eps() }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dt: defaults::dt(),
            process_noise: defaults::process_noise(),
            measurement_noise: defaults::measurement_noise(),
            initial_covariance: defaults::initial_covariance(),
        }
    }
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            gate_distance_m: defaults::gate_distance_m(),
            max_missed_frames: defaults::max_missed_frames(),
            max_tracks: defaults::max_tracks(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_tracking: defaults::enable_tracking(),
            latency_target_ms: defaults::latency_target_ms(),
            subscriber_capacity: defaults::subscriber_capacity(),
        }
    }
}

impl CfarConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_nonzero(self.training_cells, "cfar.training_cells")?;
        validate_probability(self.pfa, "cfar.pfa")?;
        Ok(())
    }

    /// Half-width of the square neighbourhood, also the untested border margin
    pub fn margin(&self) -> usize {
        self.guard_cells.saturating_add(self.training_cells)
    }

    /// Nominal training population used for the threshold factor
    pub fn nominal_training_count(&self) -> usize {
        self.training_cells.saturating_mul(cfar::TRAINING_SIDES)
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_positive(self.eps, "clustering.eps")
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_positive(self.dt, "tracking.dt")?;
        validate_finite(self.process_noise, "tracking.process_noise")?;
        validate_range(self.process_noise, 0.0, f64::MAX, "tracking.process_noise")?;
        // Zero R is allowed here; the tracker reports the singular S it produces
        validate_finite(self.measurement_noise, "tracking.measurement_noise")?;
        validate_range(self.measurement_noise, 0.0, f64::MAX, "tracking.measurement_noise")?;
        validate_finite(self.initial_covariance, "tracking.initial_covariance")?;
        validate_range(self.initial_covariance, 0.0, f64::MAX, "tracking.initial_covariance")?;
        Ok(())
    }
}

impl AssociationConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_positive(self.gate_distance_m, "association.gate_distance_m")?;
        validate_nonzero(self.max_tracks, "association.max_tracks")?;
        Ok(())
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_positive(self.latency_target_ms, "pipeline.latency_target_ms")?;
        validate_range(
            self.subscriber_capacity,
            1,
            pipeline::MAX_SUBSCRIBER_CAPACITY,
            "pipeline.subscriber_capacity",
        )?;
        Ok(())
    }
}
