//! API handlers module

pub mod health;
pub mod papers;
pub mod recommendations;
pub mod search;

use paperboard_common::errors::{AppError, Result};
use validator::Validate;

/// Run `validator` rules, reporting the first offending field
pub(crate) fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        field: e.field_errors().keys().next().map(|field| field.to_string()),
        message: e.to_string(),
    })
}
