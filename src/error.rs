// src/error.rs
//! Unified error handling for the radar core
//!
//! Every component reports failures through [`RadarError`]. Each variant carries an
//! [`ErrorContext`] naming the component and operation that failed, so errors stay
//! traceable once they cross the pipeline boundary.
//!
//! Taxonomy:
//! - `Configuration`: invalid session parameters, fatal before any frame is processed
//! - `ShapeMismatch`: a frame disagrees with the configured shape, the frame is rejected
//! - `DegenerateNumerics`: a singular innovation covariance, fatal for one track only
//! - `InvalidState` / `InvalidData`: API misuse or non-finite inputs
//! - `Source`: failures raised by an acquisition collaborator
//!
//! An empty detection or cluster list is never an error.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

/// Unified error type for the radar processing core
#[derive(Debug, Clone, Error)]
pub enum RadarError {
    /// Invalid configuration detected at construction time
    #[error("[CONFIG] Configuration error in {component}: {reason} ({context})")]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Raw frame dimensions disagree with the radar configuration
    #[error("[SHAPE] Frame shape mismatch: expected {expected:?} (chirps, samples), got {actual:?} ({context})")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
        context: ErrorContext,
    },

    /// Numerically degenerate computation (e.g. singular innovation covariance)
    #[error("[NUMERICS] {stage:?} stage degenerate: {reason} ({context})")]
    DegenerateNumerics {
        stage: ProcessingStage,
        reason: String,
        context: ErrorContext,
    },

    /// Operation issued in a state that does not allow it
    #[error("[STATE] Invalid state in {component}: {reason} ({context})")]
    InvalidState {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Input data that cannot be processed (non-finite values, empty arrays)
    #[error("[DATA] Invalid {data_type}: {reason} ({context})")]
    InvalidData {
        data_type: String,
        reason: String,
        context: ErrorContext,
    },

    /// Error raised by a frame source or other external collaborator
    #[error("[SOURCE] {subsystem} error: {error} ({context})")]
    Source {
        subsystem: String,
        #[source]
        error: Arc<dyn Error + Send + Sync>,
        context: ErrorContext,
    },
}

/// Stage a numerically degenerate computation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    /// Kalman update of a single track
    Tracking,
}

/// Error context for debugging and analysis
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.operation)?;
        if let (Some(file), Some(line)) = (self.file, self.line) {
            write!(f, " at {}:{}", file, line)?;
        }
        Ok(())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl RadarError {
    /// Context attached to this error
    pub fn context(&self) -> &ErrorContext {
        match self {
            RadarError::Configuration { context, .. }
            | RadarError::ShapeMismatch { context, .. }
            | RadarError::DegenerateNumerics { context, .. }
            | RadarError::InvalidState { context, .. }
            | RadarError::InvalidData { context, .. }
            | RadarError::Source { context, .. } => context,
        }
    }

    /// Errors that end the session: nothing can be processed until the cause is fixed
    pub fn is_fatal(&self) -> bool {
        matches!(self, RadarError::Configuration { .. } | RadarError::Source { .. })
    }

    /// Errors confined to a single track; the owner resets that track and carries on
    pub fn is_track_local(&self) -> bool {
        matches!(self, RadarError::DegenerateNumerics { stage: ProcessingStage::Tracking, .. })
    }

    /// Errors that reject one frame without affecting the session
    pub fn is_frame_rejection(&self) -> bool {
        matches!(self, RadarError::ShapeMismatch { .. } | RadarError::InvalidData { .. })
    }
}

/// Result type alias for radar operations
pub type RadarResult<T> = Result<T, RadarError>;

/// Error builder for convenient error construction
pub struct RadarErrorBuilder {
    component: String,
    operation: String,
}

impl RadarErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(&self.component, &self.operation)
    }

    pub fn configuration(self, reason: &str) -> RadarError {
        let context = self.context();
        RadarError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    pub fn shape_mismatch(self, expected: (usize, usize), actual: (usize, usize)) -> RadarError {
        RadarError::ShapeMismatch {
            expected,
            actual,
            context: self.context(),
        }
    }

    pub fn degenerate(self, stage: ProcessingStage, reason: &str) -> RadarError {
        RadarError::DegenerateNumerics {
            stage,
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn invalid_state(self, reason: &str) -> RadarError {
        let context = self.context();
        RadarError::InvalidState {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> RadarError {
        RadarError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }
}

/// Convenience trait for wrapping foreign errors
pub trait IntoRadarError<T> {
    fn radar_err(self, component: &str, operation: &str) -> RadarResult<T>;
}

impl<T, E> IntoRadarError<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn radar_err(self, component: &str, operation: &str) -> RadarResult<T> {
        self.map_err(|err| RadarError::Source {
            subsystem: component.to_string(),
            error: Arc::new(err),
            context: ErrorContext::new(component, operation),
        })
    }
}

impl From<crate::utils::validation::ValidationError> for RadarError {
    fn from(err: crate::utils::validation::ValidationError) -> Self {
        let context = error_context!("config", "validate");
        RadarError::Configuration {
            component: err.field().to_string(),
            reason: err.to_string(),
            context,
        }
    }
}

impl From<crate::config::loader::ConfigError> for RadarError {
    fn from(err: crate::config::loader::ConfigError) -> Self {
        let context = error_context!("config_loader", "load");
        RadarError::Configuration {
            component: "config_loader".to_string(),
            reason: err.to_string(),
            context,
        }
    }
}
