//! services/api/src/web/validation.rs
//!
//! Shared validation helpers for request payloads.

use campus_safety_core::domain::{GeoPoint, MAX_WALK_MINUTES};

use crate::web::error::AppError;

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Like `required`, but a missing value is fine.
pub fn required_if_present(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    value.map(|v| required(field, v)).transpose()
}

/// Trims an optional free-text field, treating blank input as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn coordinates(lat: f64, lng: f64) -> Result<GeoPoint, AppError> {
    GeoPoint::new(lat, lng).ok_or_else(|| AppError::Validation("Invalid coordinates".to_string()))
}

/// A walk length or extension, between 1 and `MAX_WALK_MINUTES`.
pub fn positive_minutes(field: &str, minutes: i32) -> Result<i32, AppError> {
    if minutes < 1 {
        return Err(AppError::Validation(format!("{} must be at least 1 minute", field)));
    }
    if minutes > MAX_WALK_MINUTES {
        return Err(AppError::Validation(format!(
            "{} must be at most {} minutes",
            field, MAX_WALK_MINUTES
        )));
    }
    Ok(minutes)
}
