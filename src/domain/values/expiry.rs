use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeriesKind {
    Monthly,
    Weekly,
    Daily,
}

/// Parse the ISO date prefix of an expiration label.
pub fn expiry_date(label: &str) -> Option<NaiveDate> {
    let prefix = label.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Standard monthly expirations fall on the third Friday.
pub fn is_third_friday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Fri && (15..=21).contains(&date.day())
}

pub fn series_kind(label: &str) -> Option<SeriesKind> {
    let date = expiry_date(label)?;
    Some(if is_third_friday(date) {
        SeriesKind::Monthly
    } else if date.weekday() == Weekday::Fri {
        SeriesKind::Weekly
    } else {
        SeriesKind::Daily
    })
}

pub fn is_standard_monthly(label: &str) -> bool {
    series_kind(label) == Some(SeriesKind::Monthly)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_third_friday() {
        assert!(is_standard_monthly("2025-01-17"));
        assert!(is_standard_monthly("2025-02-21:35"));
        assert!(!is_standard_monthly("2025-01-24"));
        assert!(!is_standard_monthly("garbage"));
    }

    #[test]
    fn test_series_kind() {
        assert_eq!(series_kind("2025-01-24"), Some(SeriesKind::Weekly));
        assert_eq!(series_kind("2025-01-22"), Some(SeriesKind::Daily));
    }
}
