use crate::error::{ClinicError, Result};
use chrono::{Duration, NaiveDate};

/// Parse a `--date` filter relative to `today`
///
/// Accepts `today`, `yesterday` or a `YYYY-MM-DD` date. Days are UTC days,
/// the same calendar ticket numbers are issued against.
pub fn parse_day(filter: &str, today: NaiveDate) -> Result<NaiveDate> {
    let filter = filter.trim();
    match filter.to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {},
    }

    NaiveDate::parse_from_str(filter, "%Y-%m-%d").map_err(|_| {
        ClinicError::validation(format!(
            "Invalid date filter: '{filter}'. Use 'today', 'yesterday' or a date like '2024-01-15'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_relative_days() {
        let today = day(2024, 3, 1);
        assert_eq!(parse_day("today", today).unwrap(), today);
        assert_eq!(parse_day("Yesterday", today).unwrap(), day(2024, 2, 29));
    }

    #[test]
    fn test_explicit_date() {
        assert_eq!(
            parse_day(" 2024-01-15 ", day(2024, 3, 1)).unwrap(),
            day(2024, 1, 15)
        );
    }

    #[test]
    fn test_invalid_filter() {
        let err = parse_day("last-week", day(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
        assert!(err.to_string().contains("last-week"));
    }
}
