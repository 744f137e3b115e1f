// src/config/radar_config.rs
//! FMCW front-end parameters and the resolutions derived from them
//!
//! [`RadarSettings`] is the plain, serializable form read from config files.
//! [`RadarConfig`] is the validated session object: its derived resolutions are
//! computed once in [`RadarConfig::new`] and cannot be changed independently.
//! Changing any parameter means building a new `RadarConfig`.

use crate::config::constants::{physics::SPEED_OF_LIGHT_MPS, radar};
use crate::error::{RadarError, RadarErrorBuilder, RadarResult};
use crate::utils::validation::{validate_nonzero, validate_positive, validate_range, ValidationResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Raw radar parameters as they appear in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSettings {
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: f64,

    #[serde(default = "defaults::chirp_bandwidth_hz")]
    pub chirp_bandwidth_hz: f64,

    #[serde(default = "defaults::chirp_duration_s")]
    pub chirp_duration_s: f64,

    #[serde(default = "defaults::num_chirps")]
    pub num_chirps: usize,

    #[serde(default = "defaults::num_samples")]
    pub num_samples: usize,

    #[serde(default = "defaults::center_freq_hz")]
    pub center_freq_hz: f64,
}

mod defaults {
    use crate::config::constants::radar::*;

    pub fn sample_rate_hz() -> f64 { DEFAULT_SAMPLE_RATE_HZ }
    pub fn chirp_bandwidth_hz() -> f64 { DEFAULT_CHIRP_BANDWIDTH_HZ }
    pub fn chirp_duration_s() -> f64 { DEFAULT_CHIRP_DURATION_S }
    pub fn num_chirps() -> usize { DEFAULT_NUM_CHIRPS }
    pub fn num_samples() -> usize { DEFAULT_NUM_SAMPLES }
    pub fn center_freq_hz() -> f64 { DEFAULT_CENTER_FREQ_HZ }
}

impl Default for RadarSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::sample_rate_hz(),
            chirp_bandwidth_hz: defaults::chirp_bandwidth_hz(),
            chirp_duration_s: defaults::chirp_duration_s(),
            num_chirps: defaults::num_chirps(),
            num_samples: defaults::num_samples(),
            center_freq_hz: defaults::center_freq_hz(),
        }
    }
}

impl RadarSettings {
    /// Check every parameter; the first violation is returned
    pub fn validate(&self) -> ValidationResult<()> {
        validate_positive(self.sample_rate_hz, "radar.sample_rate_hz")?;
        validate_positive(self.chirp_bandwidth_hz, "radar.chirp_bandwidth_hz")?;
        validate_positive(self.chirp_duration_s, "radar.chirp_duration_s")?;
        validate_positive(self.center_freq_hz, "radar.center_freq_hz")?;
        validate_nonzero(self.num_chirps, "radar.num_chirps")?;
        validate_range(
            self.num_samples,
            radar::MIN_NUM_SAMPLES,
            radar::MAX_FRAME_CELLS,
            "radar.num_samples",
        )?;
        validate_range(
            self.num_chirps.saturating_mul(self.num_samples),
            radar::MIN_NUM_CHIRPS * radar::MIN_NUM_SAMPLES,
            radar::MAX_FRAME_CELLS,
            "radar.num_chirps*num_samples",
        )?;
        Ok(())
    }
}

/// Immutable per-session radar configuration with derived resolutions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RadarSettings", into = "RadarSettings")]
pub struct RadarConfig {
    settings: RadarSettings,
    range_resolution: f64,
    max_range: f64,
    velocity_resolution: f64,
}

impl RadarConfig {
    /// Validate settings and derive range/velocity resolutions
    pub fn new(settings: RadarSettings) -> RadarResult<Self> {
        settings
            .validate()
            .map_err(|e| RadarErrorBuilder::new("radar_config", "new").configuration(&e.to_string()))?;

        let (range_resolution, max_range, velocity_resolution) = Self::derive(&settings);

        // Extreme-but-valid inputs can still overflow or underflow
        for (name, value) in [
            ("range_resolution", range_resolution),
            ("max_range", max_range),
            ("velocity_resolution", velocity_resolution),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RadarErrorBuilder::new("radar_config", "new")
                    .configuration(&format!("derived {} is not a positive finite value ({})", name, value)));
            }
        }

        info!(
            range_resolution_m = range_resolution,
            max_range_m = max_range,
            velocity_resolution_mps = velocity_resolution,
            num_chirps = settings.num_chirps,
            num_samples = settings.num_samples,
            "FMCW radar configured"
        );

        Ok(Self {
            settings,
            range_resolution,
            max_range,
            velocity_resolution,
        })
    }

    /// `(range_resolution, max_range, velocity_resolution)`
    fn derive(settings: &RadarSettings) -> (f64, f64, f64) {
        let c = SPEED_OF_LIGHT_MPS;
        let range_resolution = c / (2.0 * settings.chirp_bandwidth_hz);
        let max_range =
            c * settings.sample_rate_hz * settings.chirp_duration_s / (2.0 * settings.chirp_bandwidth_hz);
        let velocity_resolution = c
            / (2.0 * settings.center_freq_hz * settings.chirp_duration_s * settings.num_chirps as f64);
        (range_resolution, max_range, velocity_resolution)
    }

    pub fn settings(&self) -> &RadarSettings {
        &self.settings
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.settings.sample_rate_hz
    }

    pub fn chirp_bandwidth_hz(&self) -> f64 {
        self.settings.chirp_bandwidth_hz
    }

    pub fn chirp_duration_s(&self) -> f64 {
        self.settings.chirp_duration_s
    }

    pub fn num_chirps(&self) -> usize {
        self.settings.num_chirps
    }

    pub fn num_samples(&self) -> usize {
        self.settings.num_samples
    }

    pub fn center_freq_hz(&self) -> f64 {
        self.settings.center_freq_hz
    }

    /// Range covered by one range bin (m)
    pub fn range_resolution(&self) -> f64 {
        self.range_resolution
    }

    /// Maximum unambiguous range (m)
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Radial velocity covered by one Doppler bin (m/s)
    pub fn velocity_resolution(&self) -> f64 {
        self.velocity_resolution
    }

    /// Expected raw frame shape `(num_chirps, num_samples)`
    pub fn frame_shape(&self) -> (usize, usize) {
        (self.settings.num_chirps, self.settings.num_samples)
    }

    /// Range-Doppler map shape `(num_chirps, num_samples / 2)`
    pub fn map_shape(&self) -> (usize, usize) {
        (self.settings.num_chirps, self.settings.num_samples / 2)
    }

    /// Doppler row holding zero radial velocity after the fftshift
    pub fn zero_doppler_bin(&self) -> usize {
        self.settings.num_chirps / 2
    }

    pub fn range_bin_to_meters(&self, range_bin: f64) -> f64 {
        range_bin * self.range_resolution
    }

    pub fn doppler_bin_to_velocity(&self, doppler_bin: f64) -> f64 {
        (doppler_bin - self.zero_doppler_bin() as f64) * self.velocity_resolution
    }

    /// `(distance_m, velocity_mps)` for fractional bin coordinates
    pub fn bins_to_physical(&self, range_bin: f64, doppler_bin: f64) -> (f64, f64) {
        (
            self.range_bin_to_meters(range_bin),
            self.doppler_bin_to_velocity(doppler_bin),
        )
    }

    pub fn meters_to_range_bin(&self, distance_m: f64) -> f64 {
        distance_m / self.range_resolution
    }

    /// Velocity expressed as an offset from the zero-Doppler bin
    pub fn velocity_to_doppler_offset(&self, velocity_mps: f64) -> f64 {
        velocity_mps / self.velocity_resolution
    }
}

impl Default for RadarConfig {
    fn default() -> Self {
        // Built-in defaults are known valid, so validation and logging are skipped
        let settings = RadarSettings::default();
        let (range_resolution, max_range, velocity_resolution) = Self::derive(&settings);
        Self {
            settings,
            range_resolution,
            max_range,
            velocity_resolution,
        }
    }
}

impl TryFrom<RadarSettings> for RadarConfig {
    type Error = RadarError;

    fn try_from(settings: RadarSettings) -> Result<Self, Self::Error> {
        RadarConfig::new(settings)
    }
}

impl From<RadarConfig> for RadarSettings {
    fn from(config: RadarConfig) -> Self {
        config.settings
    }
}
