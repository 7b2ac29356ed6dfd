use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serializer;
use std::borrow::Cow;
use validator::ValidationError;

/// Parses an instant from the forms the dashboard and query strings send:
/// full RFC 3339 (`2025-01-31T10:00:00Z`) or a bare calendar date
/// (`2025-01-31`, read as midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_instant(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` adapter for [`format_instant`].
pub fn serialize_instant<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_instant(value))
}

/// `validator` rule for optional date inputs.
pub fn validate_instant(value: &str) -> Result<(), ValidationError> {
    match parse_instant(value) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("date");
            err.message = Some(Cow::Borrowed(
                "Invalid date, expected YYYY-MM-DD or an RFC 3339 timestamp",
            ));
            Err(err)
        }
    }
}
