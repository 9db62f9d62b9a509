//! Field-level input checks shared by the request types.
//!
//! Limits follow the public submission forms: store names up to 80 characters,
//! addresses up to 120, review bodies between 10 and 1000, author names up to 30.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::error::AppError;

pub const STORE_NAME_MAX: usize = 80;
pub const STORE_ADDRESS_MAX: usize = 120;
pub const REVIEW_BODY_MIN: usize = 10;
pub const REVIEW_BODY_MAX: usize = 1000;
pub const AUTHOR_NAME_MAX: usize = 30;
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

/// Trim `value` and check it is non-empty and at most `max` characters.
pub fn required_text(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    check_max_chars(trimmed, field, max)?;
    Ok(trimmed.to_string())
}

/// Trim an optional free-text field. Blank input is stored as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn check_max_chars(value: &str, field: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Review bodies are counted in characters, not bytes.
pub fn review_body(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < REVIEW_BODY_MIN {
        return Err(AppError::Validation(format!(
            "body must be at least {REVIEW_BODY_MIN} characters"
        )));
    }
    if len > REVIEW_BODY_MAX {
        return Err(AppError::Validation(format!(
            "body must be at most {REVIEW_BODY_MAX} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Website URLs are optional; when present they must be absolute http(s) URLs.
pub fn website_url(value: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };

    let parsed = url::Url::parse(&raw)
        .map_err(|_| AppError::Validation("websiteUrl must be a valid URL".to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(Some(raw)),
        _ => Err(AppError::Validation(
            "websiteUrl must use http or https".to_string(),
        )),
    }
}

/// Coerce a submitted rating to an integer in `1..=5`.
///
/// Accepts JSON integers, floats with no fractional part, and numeric strings
/// (forms submit the star selection as a string).
pub fn rating(value: &Value) -> Result<i32, AppError> {
    let invalid = || {
        AppError::Validation(format!(
            "rating must be an integer from {RATING_MIN} to {RATING_MAX}"
        ))
    };

    let number = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64().ok_or_else(invalid)?;
                if f.fract() != 0.0 {
                    return Err(invalid());
                }
                f as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if !(i64::from(RATING_MIN)..=i64::from(RATING_MAX)).contains(&number) {
        return Err(invalid());
    }

    Ok(number as i32)
}

/// Parse a visit date. Blank means "not given".
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, of which only the date is kept.
pub fn visited_at(value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    let Some(raw) = optional_text(value) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| AppError::Validation("visitedAt must be a date (YYYY-MM-DD)".to_string()))
}
