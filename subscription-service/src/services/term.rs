use crate::services::error::ServiceError;
use chrono::{DateTime, Months, Utc};

/// End of a subscription term: `start` plus `duration` calendar months.
///
/// When the target month is shorter than the start day the result clamps to
/// the last day of that month (Jan 31 + 1 month is Feb 28, or Feb 29 in a
/// leap year). Time of day is preserved.
pub fn compute_end_date(start: DateTime<Utc>, duration: i32) -> Result<DateTime<Utc>, ServiceError> {
    let months = u32::try_from(duration)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| ServiceError::invalid_field("duration", "Duration must be a positive number of months"))?;

    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| ServiceError::invalid_field("startDate", "End date is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn adds_whole_months() {
        assert_eq!(compute_end_date(at(2025, 3, 15), 1).unwrap(), at(2025, 4, 15));
        assert_eq!(compute_end_date(at(2025, 1, 1), 12).unwrap(), at(2026, 1, 1));
    }

    #[test]
    fn clamps_to_the_end_of_short_months() {
        assert_eq!(compute_end_date(at(2025, 1, 31), 1).unwrap(), at(2025, 2, 28));
        assert_eq!(compute_end_date(at(2024, 1, 31), 1).unwrap(), at(2024, 2, 29));
        assert_eq!(compute_end_date(at(2025, 8, 31), 1).unwrap(), at(2025, 9, 30));
    }

    #[test]
    fn rolls_over_the_year() {
        assert_eq!(compute_end_date(at(2025, 11, 30), 3).unwrap(), at(2026, 2, 28));
    }

    #[test]
    fn keeps_time_of_day() {
        let start = Utc.with_ymd_and_hms(2025, 5, 10, 13, 45, 0).unwrap();
        let end = compute_end_date(start, 2).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 7, 10, 13, 45, 0).unwrap());
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(compute_end_date(at(2025, 1, 1), 0).is_err());
        assert!(compute_end_date(at(2025, 1, 1), -3).is_err());
    }
}
