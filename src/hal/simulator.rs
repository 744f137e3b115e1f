// src/hal/simulator.rs
//! Synthetic FMCW scene generator
//!
//! Each point target contributes a dechirped beat tone
//! `A·exp(j2π(k_r·n/N + k_d·m/M))` where `n` is the sample index within a
//! chirp, `m` the chirp index, `k_r = range / range_resolution` and
//! `k_d = velocity / velocity_resolution`. Complex white Gaussian noise is
//! added on top, drawn with Box-Muller from a seeded `StdRng` so runs are
//! reproducible.

use crate::config::constants::simulation;
use crate::config::RadarConfig;
use crate::error::RadarError;
use crate::hal::traits::FrameSource;
use crate::processing::spectral::RawFrame;
use crate::utils::validation::{validate_finite, validate_positive, validate_range, ValidationResult};
use async_trait::async_trait;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, info, trace};

/// A point reflector in the simulated scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTarget {
    pub range_m: f64,
    /// Positive values move away from the radar
    pub velocity_mps: f64,
    pub amplitude: f64,
}

impl SimulatedTarget {
    pub fn stationary(range_m: f64, amplitude: f64) -> Self {
        Self {
            range_m,
            velocity_mps: 0.0,
            amplitude,
        }
    }

    pub fn moving(range_m: f64, velocity_mps: f64, amplitude: f64) -> Self {
        Self {
            range_m,
            velocity_mps,
            amplitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Standard deviation of each noise component (I and Q)
    #[serde(default = "defaults::noise_std")]
    pub noise_std: f64,

    /// Fixed RNG seed; `None` seeds from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,

    /// Simulated time between frames; targets advance by `velocity · interval`
    #[serde(default = "defaults::frame_interval_s")]
    pub frame_interval_s: f64,

    /// Sleep `frame_interval_s` before each frame (service builds only)
    #[serde(default)]
    pub realtime: bool,
}

mod defaults {
    use crate::config::constants::simulation::*;

    pub fn noise_std() -> f64 { DEFAULT_NOISE_STD }
    pub fn frame_interval_s() -> f64 { DEFAULT_FRAME_INTERVAL_S }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            noise_std: defaults::noise_std(),
            seed: None,
            frame_interval_s: defaults::frame_interval_s(),
            realtime: false,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_finite(self.noise_std, "simulator.noise_std")?;
        validate_range(self.noise_std, 0.0, f64::MAX, "simulator.noise_std")?;
        validate_positive(self.frame_interval_s, "simulator.frame_interval_s")?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Invalid simulator configuration: {0}")]
    Configuration(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Simulator is not running")]
    NotRunning,

    #[error("Frame construction failed: {0}")]
    Frame(#[from] RadarError),
}

/// Frame source that synthesises a scene of point targets in noise
#[derive(Debug)]
pub struct SceneSimulator {
    radar: RadarConfig,
    config: SimulatorConfig,
    targets: Vec<SimulatedTarget>,
    rng: StdRng,
    running: bool,
    frames_generated: u64,
}

impl SceneSimulator {
    /// Empty scene (noise only)
    pub fn new(radar: RadarConfig, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config
            .validate()
            .map_err(|e| SimulatorError::Configuration(e.to_string()))?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            radar,
            config,
            targets: Vec::new(),
            rng,
            running: false,
            frames_generated: 0,
        })
    }

    /// Two-person scene: stationary at 3 m, receding at 1 m/s from 5 m
    pub fn demo_scene(radar: RadarConfig, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        let mut simulator = Self::new(radar, config)?;
        simulator.add_target(SimulatedTarget::stationary(
            simulation::DEMO_STATIC_RANGE_M,
            simulation::DEMO_TARGET_AMPLITUDE,
        ))?;
        simulator.add_target(SimulatedTarget::moving(
            simulation::DEMO_MOVING_RANGE_M,
            simulation::DEMO_MOVING_VELOCITY_MPS,
            simulation::DEMO_TARGET_AMPLITUDE,
        ))?;
        Ok(simulator)
    }

    pub fn add_target(&mut self, target: SimulatedTarget) -> Result<(), SimulatorError> {
        let finite = target.range_m.is_finite()
            && target.velocity_mps.is_finite()
            && target.amplitude.is_finite();
        if !finite || target.range_m < 0.0 || target.amplitude < 0.0 {
            return Err(SimulatorError::InvalidTarget(format!("{:?}", target)));
        }
        if target.range_m > self.radar.max_range() {
            debug!(
                range_m = target.range_m,
                max_range_m = self.radar.max_range(),
                "Target beyond maximum range will alias"
            );
        }
        self.targets.push(target);
        Ok(())
    }

    pub fn targets(&self) -> &[SimulatedTarget] {
        &self.targets
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn frames_generated(&self) -> u64 {
        self.frames_generated
    }

    /// Move every target along its velocity for `dt` seconds
    pub fn advance(&mut self, dt: f64) {
        for target in &mut self.targets {
            target.range_m = (target.range_m + target.velocity_mps * dt).max(0.0);
        }
    }

    /// Synthesise one frame of the current scene without moving the targets
    pub fn generate_frame(&mut self) -> Result<RawFrame, SimulatorError> {
        let (num_chirps, num_samples) = self.radar.frame_shape();
        let mut data = Array2::<Complex<f32>>::zeros((num_chirps, num_samples));

        if self.config.noise_std > 0.0 {
            let std = self.config.noise_std;
            for value in data.iter_mut() {
                let (i, q) = box_muller(&mut self.rng);
                *value = Complex::new((i * std) as f32, (q * std) as f32);
            }
        }

        for target in &self.targets {
            let range_bin = target.range_m / self.radar.range_resolution();
            let doppler_bin = target.velocity_mps / self.radar.velocity_resolution();
            for ((chirp, sample), value) in data.indexed_iter_mut() {
                let phase = 2.0
                    * PI
                    * (range_bin * sample as f64 / num_samples as f64
                        + doppler_bin * chirp as f64 / num_chirps as f64);
                let tone = Complex::from_polar(target.amplitude, phase);
                *value += Complex::new(tone.re as f32, tone.im as f32);
            }
        }

        self.frames_generated += 1;
        trace!(
            frame = self.frames_generated,
            targets = self.targets.len(),
            "Synthetic frame generated"
        );
        Ok(RawFrame::new(&self.radar, data)?)
    }
}

/// Two independent standard normal draws
fn box_muller(rng: &mut StdRng) -> (f64, f64) {
    // 1 - U keeps the logarithm argument in (0, 1]
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    let radius = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * PI * u2;
    (radius * theta.cos(), radius * theta.sin())
}

#[cfg(feature = "service")]
async fn pace(interval_s: f64) {
    tokio::time::sleep(std::time::Duration::from_secs_f64(interval_s)).await;
}

#[cfg(not(feature = "service"))]
async fn pace(_interval_s: f64) {}

#[async_trait]
impl FrameSource for SceneSimulator {
    type Error = SimulatorError;

    async fn start(&mut self) -> Result<(), Self::Error> {
        self.running = true;
        info!(
            targets = self.targets.len(),
            noise_std = self.config.noise_std,
            "Scene simulator started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), Self::Error> {
        self.running = false;
        info!(frames = self.frames_generated, "Scene simulator stopped");
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<RawFrame, Self::Error> {
        if !self.running {
            return Err(SimulatorError::NotRunning);
        }

        if self.config.realtime {
            pace(self.config.frame_interval_s).await;
        }

        let frame = self.generate_frame()?;
        self.advance(self.config.frame_interval_s);
        Ok(frame)
    }

    fn radar_config(&self) -> &RadarConfig {
        &self.radar
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarSettings;
    use crate::processing::spectral::SpectralProcessor;

    fn small_radar() -> RadarConfig {
        RadarConfig::new(RadarSettings {
            num_chirps: 16,
            num_samples: 32,
            ..RadarSettings::default()
        })
        .unwrap()
    }

    fn quiet() -> SimulatorConfig {
        SimulatorConfig {
            noise_std: 0.0,
            seed: Some(1),
            ..SimulatorConfig::default()
        }
    }

    #[test]
    fn test_noiseless_target_peaks_at_expected_bins() {
        let radar = small_radar();
        let mut sim = SceneSimulator::new(radar.clone(), quiet()).unwrap();
        sim.add_target(SimulatedTarget::moving(
            5.0 * radar.range_resolution(),
            2.0 * radar.velocity_resolution(),
            1.0,
        ))
        .unwrap();

        let frame = sim.generate_frame().unwrap();
        assert_eq!(frame.shape(), (16, 32));

        let map = SpectralProcessor::new(&radar).process_frame(&frame).unwrap();
        let (range_bin, doppler_bin, _) = map.peak().unwrap();
        assert_eq!(range_bin, 5);
        assert_eq!(doppler_bin, radar.zero_doppler_bin() + 2);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SimulatorConfig {
            seed: Some(42),
            ..SimulatorConfig::default()
        };
        let mut a = SceneSimulator::demo_scene(small_radar(), config.clone()).unwrap();
        let mut b = SceneSimulator::demo_scene(small_radar(), config).unwrap();
        assert_eq!(a.generate_frame().unwrap(), b.generate_frame().unwrap());
    }

    #[test]
    fn test_noise_power_matches_configuration() {
        let config = SimulatorConfig {
            noise_std: 0.5,
            seed: Some(7),
            ..SimulatorConfig::default()
        };
        let mut sim = SceneSimulator::new(RadarConfig::default(), config).unwrap();
        let frame = sim.generate_frame().unwrap();

        let n = frame.data().len() as f64;
        let mean_power = frame.data().iter().map(|v| v.norm_sqr() as f64).sum::<f64>() / n;
        // E|z|² = 2σ²
        assert!((mean_power - 0.5).abs() < 0.025, "mean power {}", mean_power);
    }

    #[test]
    fn test_advance_moves_targets() {
        let mut sim = SceneSimulator::demo_scene(small_radar(), quiet()).unwrap();
        sim.advance(0.5);
        let targets = sim.targets();
        assert_eq!(targets[0].range_m, 3.0);
        assert!((targets[1].range_m - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let bad = SimulatorConfig {
            noise_std: -1.0,
            ..SimulatorConfig::default()
        };
        assert!(matches!(
            SceneSimulator::new(small_radar(), bad),
            Err(SimulatorError::Configuration(_))
        ));

        let mut sim = SceneSimulator::new(small_radar(), quiet()).unwrap();
        assert!(sim.add_target(SimulatedTarget::stationary(f64::NAN, 1.0)).is_err());
        assert!(sim.add_target(SimulatedTarget::stationary(-1.0, 1.0)).is_err());
        assert!(sim.targets().is_empty());
    }

    #[tokio::test]
    async fn test_frame_source_lifecycle() {
        let mut sim = SceneSimulator::demo_scene(small_radar(), quiet()).unwrap();
        assert!(matches!(sim.next_frame().await, Err(SimulatorError::NotRunning)));

        sim.start().await.unwrap();
        assert!(sim.is_running());
        let frame = sim.next_frame().await.unwrap();
        assert_eq!(frame.shape(), sim.radar_config().frame_shape());
        assert_eq!(sim.frames_generated(), 1);
        // Targets advanced by one frame interval
        assert!((sim.targets()[1].range_m - 5.1).abs() < 1e-12);

        sim.stop().await.unwrap();
        assert!(!sim.is_running());
        assert!(sim.next_frame().await.is_err());
    }
}
