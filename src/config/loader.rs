// src/config/loader.rs
//! Layered configuration loader
//!
//! Sources are applied in order, later ones overriding earlier ones:
//! built-in defaults, each existing TOML file in the search path, then
//! `PRESENCE_RADAR__SECTION__KEY` environment variables.

use crate::config::{constants::paths, SystemConfig};
use crate::utils::validation::ValidationError;
use ::config::{Config, Environment, File, FileFormat};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    Parse(String),

    #[error("Configuration validation errors: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Configuration loader holding the most recently loaded configuration
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    current_config: Arc<RwLock<SystemConfig>>,
    change_notifier: Option<Sender<SystemConfig>>,
}

impl ConfigLoader {
    /// Create a loader over the default search paths
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths, lowest precedence first
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            current_config: Arc::new(RwLock::new(SystemConfig::default())),
            change_notifier: None,
        }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the system configuration
    pub fn load_system_config(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Get current configuration
    pub fn get_current_config(&self) -> SystemConfig {
        self.current_config.read().clone()
    }

    /// Receive every configuration produced by a later [`reload`](Self::reload)
    pub fn watch_changes(&mut self) -> Receiver<SystemConfig> {
        let (tx, rx) = channel::unbounded();
        self.change_notifier = Some(tx);
        rx
    }

    /// Reload configuration and notify the change watcher, if any
    pub fn reload(&mut self) -> Result<SystemConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        *self.current_config.write() = config.clone();

        if let Some(ref notifier) = self.change_notifier {
            if notifier.send(config.clone()).is_err() {
                debug!("Configuration watcher disconnected");
                self.change_notifier = None;
            }
        }

        info!("Configuration reloaded");
        Ok(config)
    }

    /// Validate a single configuration file without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: SystemConfig = toml::from_str(&content)?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = self.get_current_config();
        let toml_content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<SystemConfig, ConfigError> {
        let defaults = Config::try_from(&SystemConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        for config_path in &self.config_paths {
            if config_path.exists() {
                debug!(path = %config_path.display(), "Merging configuration file");
            }
            builder = builder.add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(paths::ENV_PREFIX)
                .prefix_separator(paths::ENV_SEPARATOR)
                .separator(paths::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: SystemConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(ConfigError::Validation)?;

        for warning in config.consistency_warnings() {
            warn!("{}", warning);
        }

        Ok(config)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ]
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert_eq!(loader.config_paths().len(), 2);
    }

    #[test]
    #[serial]
    fn test_load_default_config() {
        let mut loader = ConfigLoader::with_paths(vec![PathBuf::from("does/not/exist.toml")]);
        let config = loader.load_system_config().unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
[cfar]
guard_cells = 2
training_cells = 4

[spectral]
window = "hanning"
"#,
        );

        let mut loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);
        let config = loader.load_system_config().unwrap();
        assert_eq!(config.cfar.guard_cells, 2);
        assert_eq!(config.cfar.training_cells, 4);
        assert_eq!(config.cfar.pfa, crate::config::cfar::DEFAULT_PFA);
        assert_eq!(config.spectral.window, crate::config::WindowType::Hanning);
        assert_eq!(loader.get_current_config(), config);
    }

    #[test]
    #[serial]
    fn test_later_files_take_precedence() {
        let base = write_config("[clustering]\neps = 2.0\n");
        let local = write_config("[clustering]\neps = 3.0\n");

        let mut loader =
            ConfigLoader::with_paths(vec![base.path().to_path_buf(), local.path().to_path_buf()]);
        let config = loader.load_system_config().unwrap();
        assert_eq!(config.clustering.eps, 3.0);
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("PRESENCE_RADAR__CFAR__GUARD_CELLS", "3");
        std::env::set_var("PRESENCE_RADAR__PIPELINE__ENABLE_TRACKING", "false");

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let result = loader.load_system_config();

        std::env::remove_var("PRESENCE_RADAR__CFAR__GUARD_CELLS");
        std::env::remove_var("PRESENCE_RADAR__PIPELINE__ENABLE_TRACKING");

        let config = result.unwrap();
        assert_eq!(config.cfar.guard_cells, 3);
        assert!(!config.pipeline.enable_tracking);
    }

    #[test]
    #[serial]
    fn test_invalid_merged_config_is_rejected() {
        let file = write_config("[cfar]\npfa = 1.5\n");
        let mut loader = ConfigLoader::with_paths(vec![file.path().to_path_buf()]);
        match loader.load_system_config() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors[0].field(), "cfar.pfa"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_file_validation() {
        let loader = ConfigLoader::with_paths(Vec::new());

        let valid = write_config("[radar]\nnum_chirps = 64\n");
        assert!(loader.validate_config_file(valid.path()).is_ok());

        let invalid = write_config("[radar]\nchirp_duration_s = 0.0\n");
        assert!(matches!(
            loader.validate_config_file(invalid.path()),
            Err(ConfigError::Validation(_))
        ));

        let malformed = write_config("[radar\n");
        assert!(matches!(
            loader.validate_config_file(malformed.path()),
            Err(ConfigError::Parse(_))
        ));

        assert!(matches!(
            loader.validate_config_file("missing.toml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    #[serial]
    fn test_reload_notifies_watcher() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        let changes = loader.watch_changes();
        loader.reload().unwrap();
        let received = changes.try_recv().unwrap();
        assert_eq!(received, SystemConfig::default());
    }

    #[test]
    fn test_config_export() {
        let loader = ConfigLoader::with_paths(Vec::new());
        let temp_file = NamedTempFile::new().unwrap();

        loader.export_config(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[cfar]"));
        assert!(content.contains("[radar]"));
        assert!(loader.validate_config_file(temp_file.path()).is_ok());
    }
}
