// src/config/constants.rs
//! System-wide configuration constants

/// Physical constants
pub mod physics {
    /// Propagation speed used for all range/velocity conversions (m/s)
    pub const SPEED_OF_LIGHT_MPS: f64 = 3e8;
}

/// Radar front-end defaults (2.45 GHz ISM band SDR setup)
pub mod radar {
    pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 2e6;
    pub const DEFAULT_CHIRP_BANDWIDTH_HZ: f64 = 100e6;
    pub const DEFAULT_CHIRP_DURATION_S: f64 = 1e-3;
    pub const DEFAULT_NUM_CHIRPS: usize = 128;
    pub const DEFAULT_NUM_SAMPLES: usize = 256;
    pub const DEFAULT_CENTER_FREQ_HZ: f64 = 2.45e9;

    /// A range FFT needs at least two samples to keep a non-empty positive half
    pub const MIN_NUM_SAMPLES: usize = 2;
    pub const MIN_NUM_CHIRPS: usize = 1;
    pub const MAX_FRAME_CELLS: usize = 1 << 24;
}

/// CA-CFAR defaults
pub mod cfar {
    pub const DEFAULT_GUARD_CELLS: usize = 4;
    pub const DEFAULT_TRAINING_CELLS: usize = 8;
    pub const DEFAULT_PFA: f64 = 1e-4;

    /// Nominal training population per configured training cell (one per side)
    pub const TRAINING_SIDES: usize = 4;
}

/// Detection clustering defaults
pub mod clustering {
    /// Merge distance in bin units
    pub const DEFAULT_EPS_BINS: f64 = 1.5;
}

/// Kalman tracker defaults
pub mod tracking {
    pub const DEFAULT_DT_S: f64 = 0.1;
    pub const DEFAULT_PROCESS_NOISE: f64 = 0.1;
    pub const DEFAULT_MEASUREMENT_NOISE: f64 = 0.5;
    pub const INITIAL_COVARIANCE: f64 = 1.0;
}

/// Track association defaults
pub mod association {
    pub const DEFAULT_GATE_DISTANCE_M: f64 = 1.0;
    pub const DEFAULT_MAX_MISSED_FRAMES: u32 = 5;
    pub const DEFAULT_MAX_TRACKS: usize = 32;
}

/// Pipeline and publication defaults
pub mod pipeline {
    pub const DEFAULT_LATENCY_TARGET_MS: f64 = 100.0;
    pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 16;
    pub const MAX_SUBSCRIBER_CAPACITY: usize = 4096;
}

/// Synthetic scene defaults
pub mod simulation {
    /// Standard deviation of each I and Q noise component
    pub const DEFAULT_NOISE_STD: f64 = 1.0;
    pub const DEFAULT_FRAME_INTERVAL_S: f64 = 0.1;

    /// Demo scene: one person standing still, one walking away
    pub const DEMO_TARGET_AMPLITUDE: f64 = 0.35;
    pub const DEMO_STATIC_RANGE_M: f64 = 3.0;
    pub const DEMO_MOVING_RANGE_M: f64 = 5.0;
    pub const DEMO_MOVING_VELOCITY_MPS: f64 = 1.0;
}

/// Configuration file locations
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "presence_radar.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/presence_radar.toml";
    pub const ENV_PREFIX: &str = "PRESENCE_RADAR";
    pub const ENV_SEPARATOR: &str = "__";
}
