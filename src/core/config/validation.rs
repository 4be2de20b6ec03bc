//! Validation helper functions for configuration types.

use crate::core::errors::{Result, ShardsmithError};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ShardsmithError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a u32 value is greater than zero.
pub fn validate_positive_u32(value: u32, field: &str) -> Result<()> {
    if value == 0 {
        return Err(ShardsmithError::validation_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is in the unit range [0.0, 1.0].
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ShardsmithError::validation_field(
            format!("{} must be between 0.0 and 1.0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an ordered pair forms a non-empty inclusive range.
pub fn validate_ordered_range(min: usize, max: usize, field: &str) -> Result<()> {
    if min > max {
        return Err(ShardsmithError::validation_field(
            format!("{} minimum {} exceeds maximum {}", field, min, max),
            field,
        ));
    }
    Ok(())
}
