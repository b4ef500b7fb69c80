//! Amazon calendar week numbering.
//!
//! Weeks run Sunday through Saturday. Week 1 starts on the Sunday on or before
//! January 1st; the trailing partial week of December folds back into week 1
//! of the next year.

use chrono::{Datelike, Duration, NaiveDate};

use crate::filename::WEEKS_PER_YEAR;

/// Amazon week number (1..=52) of a date.
pub fn amazon_week(date: NaiveDate) -> u32 {
    let week_1_start = week_one_start(date.year());
    let weeks = ((date - week_1_start).num_days() / 7 + 1) as u32;
    if weeks > WEEKS_PER_YEAR {
        weeks - WEEKS_PER_YEAR
    } else {
        weeks
    }
}

/// Amazon year of a date: late-December dates in week 1 belong to the next year.
pub fn amazon_year(date: NaiveDate) -> i32 {
    if amazon_week(date) == 1 && date.month() == 12 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// First day (Sunday) of the given Amazon week.
pub fn amazon_week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let start = week_one_start(year);
    start.checked_add_signed(Duration::weeks(i64::from(week.max(1)) - 1))
}

/// Last day (Saturday) of the given Amazon week.
pub fn amazon_week_end(year: i32, week: u32) -> Option<NaiveDate> {
    amazon_week_start(year, week).and_then(|d| d.checked_add_signed(Duration::days(6)))
}

/// Sunday on or before January 1st of `year`.
fn week_one_start(year: i32) -> NaiveDate {
    let jan_1 = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
    let back = i64::from(jan_1.weekday().num_days_from_sunday());
    jan_1 - Duration::days(back)
}

/// Parse an ISO `YYYY-MM-DD` date, optionally followed by a time part.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_one_contains_january_first() {
        // 2024-01-01 is a Monday; week 1 starts Sunday 2023-12-31.
        assert_eq!(amazon_week(d(2024, 1, 1)), 1);
        assert_eq!(amazon_week(d(2024, 1, 6)), 1);
        assert_eq!(amazon_week(d(2024, 1, 7)), 2);
    }

    #[test]
    fn test_december_tail_folds_to_week_one() {
        // 2023-12-31 is the Sunday starting week 1 of 2024.
        assert_eq!(amazon_week(d(2023, 12, 31)), 1);
        assert_eq!(amazon_year(d(2023, 12, 31)), 2024);
        assert_eq!(amazon_week(d(2023, 12, 30)), 52);
        assert_eq!(amazon_year(d(2023, 12, 30)), 2023);
    }

    #[test]
    fn test_week_start_and_end() {
        assert_eq!(amazon_week_start(2024, 1), Some(d(2023, 12, 31)));
        assert_eq!(amazon_week_start(2024, 20), Some(d(2024, 5, 12)));
        assert_eq!(amazon_week_end(2024, 20), Some(d(2024, 5, 18)));
        assert_eq!(amazon_week(d(2024, 5, 12)), 20);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-05-12"), Some(d(2024, 5, 12)));
        assert_eq!(parse_iso_date("2024-05-12 00:00:00"), Some(d(2024, 5, 12)));
        assert_eq!(parse_iso_date("May 12"), None);
        assert_eq!(parse_iso_date(""), None);
    }
}
