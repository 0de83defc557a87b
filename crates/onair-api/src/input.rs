//! Server-side checks on submitted fields. The forms validate too, but the
//! server does not rely on them.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use onair_types::StudentNumber;

use crate::error::ApiError;

/// Requester-supplied numbers: five raw digits only.
pub fn student_number(input: &str, now: DateTime<Utc>, zone: FixedOffset) -> Result<StudentNumber, ApiError> {
    StudentNumber::normalize(input, now, zone).map_err(|e| {
        warn!("Rejected student number: {}", e);
        ApiError::BadRequest(e.to_string())
    })
}

/// Operator-supplied numbers may also name a stored entry directly.
pub fn operator_student_number(
    input: &str,
    now: DateTime<Utc>,
    zone: FixedOffset,
) -> Result<StudentNumber, ApiError> {
    StudentNumber::normalize_or_stored(input, now, zone).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Trims `value` and rejects it if nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
