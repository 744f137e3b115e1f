// src/config/mod.rs
//! Configuration management for the radar processing core

pub mod constants;
pub mod loader;
pub mod processing_config;
pub mod radar_config;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;
pub use radar_config::{RadarConfig, RadarSettings};

use crate::error::RadarResult;
use crate::utils::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Complete system configuration, one section per component
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    #[serde(default)]
    pub radar: RadarSettings,

    #[serde(default)]
    pub spectral: SpectralConfig,

    #[serde(default)]
    pub cfar: CfarConfig,

    #[serde(default)]
    pub clustering: ClusterConfig,

    #[serde(default)]
    pub tracking: TrackerConfig,

    #[serde(default)]
    pub association: AssociationConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl SystemConfig {
    /// Validate every section, collecting all failures
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            self.radar.validate(),
            self.cfar.validate(),
            self.clustering.validate(),
            self.tracking.validate(),
            self.association.validate(),
            self.pipeline.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Build the validated radar session object
    pub fn radar_config(&self) -> RadarResult<RadarConfig> {
        RadarConfig::new(self.radar.clone())
    }

    /// Valid-but-suspicious combinations; none of these stop processing
    pub fn consistency_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let rows = self.radar.num_chirps;
        let cols = self.radar.num_samples / 2;
        let window = 2 * self.cfar.margin() + 1;
        if window > rows || window > cols {
            warnings.push(format!(
                "CFAR window ({}x{}) does not fit the {}x{} range-Doppler map; no detections will be produced",
                window, window, rows, cols
            ));
        }

        if self.clustering.eps <= 1.0 {
            warnings.push(format!(
                "Clustering eps ({}) cannot reach adjacent bins; every detection becomes its own cluster",
                self.clustering.eps
            ));
        }

        if self.tracking.measurement_noise == 0.0 && self.tracking.process_noise == 0.0 {
            warnings.push(
                "Zero process and measurement noise makes the innovation covariance singular".to_string(),
            );
        }

        warnings
    }

    /// Configuration summary for display/logging
    pub fn get_summary(&self) -> RadarResult<ConfigSummary> {
        let radar = self.radar_config()?;
        let (rows, cols) = radar.map_shape();
        Ok(ConfigSummary {
            frame_shape: radar.frame_shape(),
            map_shape: (rows, cols),
            range_resolution_m: radar.range_resolution(),
            max_range_m: radar.max_range(),
            velocity_resolution_mps: radar.velocity_resolution(),
            cfar_margin: self.cfar.margin(),
            tracking_enabled: self.pipeline.enable_tracking,
        })
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub frame_shape: (usize, usize),
    pub map_shape: (usize, usize),
    pub range_resolution_m: f64,
    pub max_range_m: f64,
    pub velocity_resolution_mps: f64,
    pub cfar_margin: usize,
    pub tracking_enabled: bool,
}
