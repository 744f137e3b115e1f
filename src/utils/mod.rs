//! Common utility functions for the radar core
//!
//! - Time providers for latency bookkeeping and deterministic tests
//! - Configuration validation helpers
//! - Power-scale (dB / linear) conversions

pub mod conversion;
pub mod time;
pub mod validation;

pub use conversion::{db_to_linear_power, linear_power_to_db, magnitude_to_db, MAGNITUDE_EPSILON};
pub use time::{
    current_timestamp_nanos, MockTimeProvider, MonotonicTimeProvider, SystemTimeProvider, TimeProvider,
};
pub use validation::{
    validate_finite, validate_nonzero, validate_positive, validate_probability, validate_range,
    ValidationError, ValidationResult,
};
