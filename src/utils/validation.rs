//! Validation utilities

use crate::types::{EngineError, EngineResult};

/// Validate that a required string field is non-empty
pub fn validate_non_empty(field: &str, value: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        Err(EngineError::Validation(format!(
            "{} cannot be empty",
            field
        )))
    } else {
        Ok(())
    }
}

/// Validate that a yen amount is not negative
pub fn validate_non_negative_amount(field: &str, amount: i64) -> EngineResult<()> {
    if amount < 0 {
        Err(EngineError::Validation(format!(
            "{} cannot be negative, got {}",
            field, amount
        )))
    } else {
        Ok(())
    }
}
