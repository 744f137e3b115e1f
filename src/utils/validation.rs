//! Validation utilities for configuration parameters
//!
//! Every config struct validates itself through these helpers so that range
//! checks and their error messages stay uniform across components.

use thiserror::Error;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of valid range
    #[error("Field '{field}' value '{value}' is out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    /// Value must be strictly positive
    #[error("Field '{field}' must be strictly positive, got '{value}'")]
    NotPositive { field: String, value: String },

    /// NaN or infinite value
    #[error("Field '{field}' must be finite, got '{value}'")]
    NotFinite { field: String, value: String },

    /// Cross-field validation failure
    #[error("Constraint violation for fields [{}]: {message}", fields.join(", "))]
    ConstraintViolation { fields: Vec<String>, message: String },
}

impl ValidationError {
    /// Name of the (first) offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::NotFinite { field, .. } => field,
            ValidationError::ConstraintViolation { fields, .. } => {
                fields.first().map(String::as_str).unwrap_or("unknown")
            }
        }
    }
}

/// Validate numeric range (inclusive)
pub fn validate_range<T>(value: T, min: T, max: T, field: &str) -> ValidationResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Validate that a float is finite and strictly positive
pub fn validate_positive(value: f64, field: &str) -> ValidationResult<()> {
    validate_finite(value, field)?;
    if value <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validate that a count is non-zero
pub fn validate_nonzero(value: usize, field: &str) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validate that a float is neither NaN nor infinite
pub fn validate_finite(value: f64, field: &str) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validate a probability in the open interval (0, 1)
pub fn validate_probability(value: f64, field: &str) -> ValidationResult<()> {
    validate_finite(value, field)?;
    if value <= 0.0 || value >= 1.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "0 (exclusive)".to_string(),
            max: "1 (exclusive)".to_string(),
        });
    }
    Ok(())
}
