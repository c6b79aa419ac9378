//! Tuning value checks shared by the config validators.

use handpad_common::error::{HandpadError, HandpadResult};

/// Finite and strictly positive.
pub(crate) fn positive(name: &str, value: f64) -> HandpadResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HandpadError::config(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

/// Within `[0, 1]`.
pub(crate) fn unit(name: &str, value: f64) -> HandpadResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HandpadError::config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

pub(crate) fn nonzero(name: &str, value: usize) -> HandpadResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(HandpadError::config(format!("{name} must be > 0")))
    }
}
