use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PipelineError, Result};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

// Hour-only times (`1990-01-01T10`, `1990-01-01T10+05:30`); chrono needs minutes
static HOUR_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}[T ]\d{2})([+-]\d{2}:\d{2})?$").expect("static regex")
});

/// Parse an ISO-8601 date or date-time into the calendar date it names.
///
/// A trailing `Z` is rewritten to `+00:00` first. Offsets are not applied:
/// `1990-05-01T23:30:00-05:00` is still the 1st of May.
pub fn parse_birth_date(raw: &str) -> Result<NaiveDate> {
    let normalized = raw.trim().replace('Z', "+00:00");
    let normalized = HOUR_ONLY.replace(&normalized, "${1}:00${2}");

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt.date_naive());
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").map_err(|e| PipelineError::InvalidDate {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Whole years between `birth` and `as_of`, counting a birthday only once
/// its month and day have been reached.
pub fn age_on(birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut age = as_of.year() - birth.year();
    if (as_of.month(), as_of.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Age for an optional birth date string. `None` in, `None` out.
pub fn calculate_age(dob: Option<&str>, as_of: NaiveDate) -> Result<Option<i32>> {
    dob.map(|raw| parse_birth_date(raw).map(|birth| age_on(birth, as_of)))
        .transpose()
}
