//! Cell parsing for case tables.
//!
//! Dates are monthly (`YYYY-MM`); the tool writes them back as the first
//! day of the month (`YYYY-MM-DD`), so both forms are accepted on read.

use chrono::{Datelike, NaiveDate};

/// Date format used when writing case tables.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a monthly date. `YYYY-MM` maps to the first of the month.
///
/// A full date is accepted only on day 1.
#[must_use]
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT) {
        return Some(date);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .filter(|date| date.day() == 1)
}

/// Formats a date the way case tables are written.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses an optional numeric cell.
///
/// Empty cells and `NaN`/`NA` markers are missing values.
///
/// # Errors
///
/// Returns the parse error if the cell is present but not a number.
pub fn parse_value(s: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let value = s.parse::<f64>()?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Formats an optional numeric cell; missing values become empty cells.
#[must_use]
pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month() {
        let date = parse_month("2018-07").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2018, 7, 1).unwrap());
    }

    #[test]
    fn parses_written_back_form() {
        let date = parse_month("2018-07-01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2018, 7, 1).unwrap());
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(parse_month("2018-13").is_none());
        assert!(parse_month("July 2018").is_none());
        assert!(parse_month("").is_none());
    }

    #[test]
    fn rejects_days_other_than_first() {
        assert!(parse_month("2018-07-15").is_none());
        assert!(parse_month("2018-07-31").is_none());
    }

    #[test]
    fn formats_first_of_month() {
        let date = NaiveDate::from_ymd_opt(2018, 7, 1).unwrap();
        assert_eq!(format_date(date), "2018-07-01");
    }

    #[test]
    fn parses_missing_markers() {
        assert_eq!(parse_value("").unwrap(), None);
        assert_eq!(parse_value("  ").unwrap(), None);
        assert_eq!(parse_value("NaN").unwrap(), None);
        assert_eq!(parse_value("nan").unwrap(), None);
        assert_eq!(parse_value("NA").unwrap(), None);
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(parse_value("12.5").unwrap(), Some(12.5));
        assert_eq!(parse_value("-3").unwrap(), Some(-3.0));
        assert!(parse_value("twelve").is_err());
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_value(None), "");
        assert_eq!(format_value(Some(15.0)), "15");
        assert_eq!(format_value(Some(0.25)), "0.25");
    }
}
