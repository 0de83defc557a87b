use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use thiserror::Error;

/// Number of digits in the form a student types in.
pub const RAW_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentNumberError {
    #[error("student number must be {RAW_LEN} digits, got {0:?}")]
    Malformed(String),
}

/// A student number in stored form: two-digit year, a literal `s`, then the
/// five raw digits (`24s10203`).
///
/// The year prefix keeps numbers from different school years apart, since the
/// school reuses raw numbers every spring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentNumber(String);

impl StudentNumber {
    /// Prefixes the raw digits from a form with the year of `now` in `zone`.
    /// Stored-form input is refused: requesters never choose their year.
    pub fn normalize(
        input: &str,
        now: DateTime<Utc>,
        zone: FixedOffset,
    ) -> Result<Self, StudentNumberError> {
        let input = input.trim();
        if !is_raw(input) {
            return Err(StudentNumberError::Malformed(input.to_string()));
        }
        let year = now.with_timezone(&zone).year().rem_euclid(100);
        Ok(Self(format!("{:02}s{}", year, input)))
    }

    /// Like [`normalize`](Self::normalize), but also takes a value already in
    /// stored form as is, so operators can address entries from past years.
    pub fn normalize_or_stored(
        input: &str,
        now: DateTime<Utc>,
        zone: FixedOffset,
    ) -> Result<Self, StudentNumberError> {
        let trimmed = input.trim();
        if is_stored(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Self::normalize(trimmed, now, zone)
    }

    /// Wraps a value read back from storage without re-validating it.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw five digits, as shown on public lists.
    pub fn raw(&self) -> &str {
        match self.0.split_once('s') {
            Some((_, raw)) => raw,
            None => &self.0,
        }
    }
}

impl fmt::Display for StudentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_raw(s: &str) -> bool {
    s.len() == RAW_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_stored(s: &str) -> bool {
    match s.split_once('s') {
        Some((year, raw)) => year.len() == 2 && year.bytes().all(|b| b.is_ascii_digit()) && is_raw(raw),
        None => false,
    }
}
