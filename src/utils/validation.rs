use crate::utils::error::{RaincastError, Result};
use std::fmt::Display;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> RaincastError {
    RaincastError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Accepts absolute `http`/`https` URLs only.
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "URL cannot be empty"));
    }

    let url = Url::parse(value)
        .map_err(|e| invalid(field, value, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field,
            value,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path.escape_default(), "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

/// Inclusive `[min, max]`. Values that compare with nothing (NaN) are rejected.
pub fn validate_range<T: PartialOrd + Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(invalid(
            field,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Half-open `[min, max)`, used for angles. NaN is rejected.
pub fn validate_half_open_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(min..max).contains(&value) {
        return Err(invalid(
            field,
            value,
            format!("Value must be at least {} and below {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_one_of<T: PartialEq + Display>(field: &str, value: T, allowed: &[T]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let allowed = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(invalid(field, value, format!("Allowed values: {}", allowed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.url", "https://api.rainviewer.com").is_ok());
        assert!(validate_url("api.url", "http://localhost:8080").is_ok());
        assert!(validate_url("api.url", "").is_err());
        assert!(validate_url("api.url", "invalid-url").is_err());

        let err = validate_url("api.url", "ftp://example.com").unwrap_err();
        assert!(err.to_string().contains("Unsupported URL scheme: ftp"));
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("api.concurrent_requests", 5, 1).is_ok());
        assert!(validate_positive_number("api.concurrent_requests", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("location.lat", 50.061, -90.0, 90.0).is_ok());
        assert!(validate_range("location.lat", -90.0, -90.0, 90.0).is_ok());
        assert!(validate_range("location.lat", 90.5, -90.0, 90.0).is_err());
        assert!(validate_range("radar.zoom", 21u8, 0, 20).is_err());
        assert!(validate_range("analysis.sweep_step", f64::NAN, 1.0, 180.0).is_err());
    }

    #[test]
    fn test_validate_half_open_range_rejects_upper_bound_and_nan() {
        assert!(validate_half_open_range("analysis.direction", 0.0, 0.0, 360.0).is_ok());
        assert!(validate_half_open_range("analysis.direction", 359.9, 0.0, 360.0).is_ok());
        assert!(validate_half_open_range("analysis.direction", 360.0, 0.0, 360.0).is_err());
        assert!(validate_half_open_range("analysis.direction", f64::NAN, 0.0, 360.0).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("radar.size", 512u32, &[256, 512]).is_ok());
        let err = validate_one_of("radar.size", 300u32, &[256, 512]).unwrap_err();
        assert!(err.to_string().contains("256, 512"));
    }

    #[test]
    fn test_validate_path_and_strings() {
        assert!(validate_path("output.path", "./output").is_ok());
        assert!(validate_path("output.path", "  ").is_err());
        assert!(validate_path("output.path", "out\0put").is_err());
        assert!(validate_non_empty_string("api.user_agent", "Raincaster/1.0").is_ok());
        assert!(validate_non_empty_string("api.user_agent", "   ").is_err());
    }
}
