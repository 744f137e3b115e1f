// tests/config_loading.rs
//! Layered loading of the shipped demo configuration

mod common;

use common::scenario_config;
use presence_radar_core::config::{loader::ConfigError, ConfigLoader, SystemConfig};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn demo_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/presence_radar.toml")
}

#[test]
#[serial]
fn test_demo_file_matches_scenario() {
    let loader = ConfigLoader::with_paths(Vec::new());
    loader.validate_config_file(demo_config_path()).unwrap();

    let mut loader = ConfigLoader::with_paths(vec![demo_config_path()]);
    let config = loader.load_system_config().unwrap();
    assert_eq!(config, scenario_config());

    let summary = config.get_summary().unwrap();
    assert!((summary.range_resolution_m - 0.1).abs() < 1e-3);
    assert!((summary.velocity_resolution_mps - 0.5).abs() < 1e-3);
    assert_eq!(summary.map_shape, (128, 128));
    assert_eq!(summary.cfar_margin, 12);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    std::env::set_var("PRESENCE_RADAR__CFAR__PFA", "0.001");
    std::env::set_var("PRESENCE_RADAR__ASSOCIATION__MAX_TRACKS", "4");

    let mut loader = ConfigLoader::with_paths(vec![demo_config_path()]);
    let result = loader.load_system_config();

    std::env::remove_var("PRESENCE_RADAR__CFAR__PFA");
    std::env::remove_var("PRESENCE_RADAR__ASSOCIATION__MAX_TRACKS");

    let config = result.unwrap();
    assert_eq!(config.cfar.pfa, 0.001);
    assert_eq!(config.association.max_tracks, 4);
    // Untouched file values survive
    assert_eq!(config.clustering.eps, 3.0);
    assert_eq!(config.radar.chirp_bandwidth_hz, 1.5e9);
}

#[test]
#[serial]
fn test_export_reloads_to_same_config() {
    let mut loader = ConfigLoader::with_paths(vec![demo_config_path()]);
    let loaded = loader.load_system_config().unwrap();

    let exported = NamedTempFile::new().unwrap();
    loader.export_config(exported.path()).unwrap();

    let mut reloader = ConfigLoader::with_paths(vec![exported.path().to_path_buf()]);
    assert_eq!(reloader.load_system_config().unwrap(), loaded);
}

#[test]
#[serial]
fn test_all_validation_failures_are_reported() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[cfar]\npfa = 0.0\n\n[clustering]\neps = 0.0\n\n[tracking]\ndt = -0.1\n"
    )
    .unwrap();

    let mut loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);
    match loader.load_system_config() {
        Err(ConfigError::Validation(errors)) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field()).collect();
            assert_eq!(fields, vec!["cfar.pfa", "clustering.eps", "tracking.dt"]);
        }
        other => panic!("expected validation errors, got {:?}", other),
    }
    // A failed load leaves the previous configuration in place
    assert_eq!(loader.get_current_config(), SystemConfig::default());
}
