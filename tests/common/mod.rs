// tests/common/mod.rs
//! Shared scenario setup for the integration tests
#![allow(dead_code)]

use presence_radar_core::config::{CfarConfig, ClusterConfig, RadarSettings, SystemConfig};
use presence_radar_core::hal::{SceneSimulator, SimulatorConfig};

/// Radar tuned for the two-person scene: 0.1 m range cells, 0.5 m/s velocity cells.
/// Both people sit far enough inside the map for the default CFAR window.
pub fn scenario_config() -> SystemConfig {
    SystemConfig {
        radar: RadarSettings {
            chirp_bandwidth_hz: 1.5e9,
            center_freq_hz: 2.34375e9,
            ..RadarSettings::default()
        },
        cfar: CfarConfig {
            guard_cells: 4,
            training_cells: 8,
            pfa: 1e-6,
        },
        clustering: ClusterConfig { eps: 3.0 },
        ..SystemConfig::default()
    }
}

/// Demo scene (3 m stationary, 5 m receding at 1 m/s) in unit-variance noise
pub fn scenario_simulator(seed: u64) -> SceneSimulator {
    let radar = scenario_config().radar_config().expect("scenario radar config");
    SceneSimulator::demo_scene(
        radar,
        SimulatorConfig {
            seed: Some(seed),
            ..SimulatorConfig::default()
        },
    )
    .expect("demo scene")
}

/// Small radar for fast property tests: 32 chirps × 64 samples
pub fn small_radar_settings() -> RadarSettings {
    RadarSettings {
        num_chirps: 32,
        num_samples: 64,
        ..RadarSettings::default()
    }
}
