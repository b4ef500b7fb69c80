//! Summary filename parsing.
//!
//! Summary files carry their planning week and covered horizons in the name,
//! e.g. `summary_file_plwk20_w-2.3.4_final.xlsx` is planning week 20 covering
//! horizons 2, 3 and 4.

use regex::Regex;
use std::fmt;
use std::path::Path;

/// Highest planning week on the Amazon calendar.
pub const WEEKS_PER_YEAR: u32 = 52;
/// Number of planning horizon slots (W-1 .. W-10).
pub const HORIZON_COUNT: u32 = 10;

lazy_static::lazy_static! {
    static ref PLANNING_WEEK_PATTERN: Regex = Regex::new(r"plwk(\d+)").unwrap();
    // Ends at the first character that cannot belong to a horizon list, so
    // copy suffixes like ` (1)` or `-final` are not part of the token.
    static ref HORIZON_PATTERN: Regex = Regex::new(r"w-([0-9A-Za-z.]*)").unwrap();
}

/// Advisory problem found while parsing a filename.
///
/// None of these stop a batch; the affected field is simply left unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// No `plwk<N>` marker.
    MissingPlanningWeek,
    /// No `w-<N>` marker.
    MissingHorizons,
    /// The horizon list contained a segment that is not all digits.
    MalformedHorizons(String),
    /// Planning week outside 1..=52.
    PlanningWeekOutOfRange(u64),
    /// Horizon outside 1..=10 (dropped from the list).
    HorizonOutOfRange(u64),
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::MissingPlanningWeek => write!(f, "no planning week marker (plwk<N>)"),
            ParseIssue::MissingHorizons => write!(f, "no horizon marker (w-<N>)"),
            ParseIssue::MalformedHorizons(token) => {
                write!(f, "malformed horizon list 'w-{}'", token)
            }
            ParseIssue::PlanningWeekOutOfRange(week) => {
                write!(f, "planning week {} is outside 1..={}", week, WEEKS_PER_YEAR)
            }
            ParseIssue::HorizonOutOfRange(h) => {
                write!(f, "horizon {} is outside 1..={}", h, HORIZON_COUNT)
            }
        }
    }
}

/// Result of parsing one filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Planning week, 1..=52
    pub planning_week: Option<u32>,
    /// Covered horizons in filename order, each 1..=10
    pub horizons: Vec<u32>,
    /// Advisory parse problems
    pub issues: Vec<ParseIssue>,
}

/// Parse a summary filename (or full path) for planning week and horizons.
///
/// Only the final path component is examined, without its extension.
pub fn parse_filename(name: &str) -> ParsedFilename {
    let stem = file_stem(name);
    let mut parsed = ParsedFilename::default();

    match PLANNING_WEEK_PATTERN.captures(stem) {
        Some(caps) => {
            // Digit runs too long for u64 are treated as out of range.
            let week = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            if (1..=WEEKS_PER_YEAR as u64).contains(&week) {
                parsed.planning_week = Some(week as u32);
            } else {
                parsed.issues.push(ParseIssue::PlanningWeekOutOfRange(week));
            }
        }
        None => parsed.issues.push(ParseIssue::MissingPlanningWeek),
    }

    match HORIZON_PATTERN.captures(stem) {
        Some(caps) => {
            let token = &caps[1];
            match parse_horizon_list(token) {
                Some(values) => {
                    for value in values {
                        if (1..=HORIZON_COUNT as u64).contains(&value) {
                            parsed.horizons.push(value as u32);
                        } else {
                            parsed.issues.push(ParseIssue::HorizonOutOfRange(value));
                        }
                    }
                }
                None => parsed
                    .issues
                    .push(ParseIssue::MalformedHorizons(token.to_string())),
            }
        }
        None => parsed.issues.push(ParseIssue::MissingHorizons),
    }

    parsed
}

/// Split `2.3.4` into numbers. `None` if any segment is empty or non-numeric.
fn parse_horizon_list(token: &str) -> Option<Vec<u64>> {
    token
        .split('.')
        .map(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                Some(segment.parse::<u64>().unwrap_or(u64::MAX))
            }
        })
        .collect()
}

/// Final path component with a known workbook extension removed.
fn file_stem(name: &str) -> &str {
    let base = Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let lower = base.to_ascii_lowercase();
    for ext in [".xlsx", ".xls"] {
        if lower.ends_with(ext) {
            return &base[..base.len() - ext.len()];
        }
    }
    base
}

/// Horizon list as it appears in a title, e.g. `2.3.4` for `2..=4`.
pub fn horizon_token(start: u32, end: u32) -> String {
    (start..=end)
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_name() {
        let p = parse_filename("summary_file_plwk20_w-2.3.4.xlsx");
        assert_eq!(p.planning_week, Some(20));
        assert_eq!(p.horizons, vec![2, 3, 4]);
        assert!(p.issues.is_empty());
    }

    #[test]
    fn test_parse_with_plan_type_suffix_and_directory() {
        let p = parse_filename("/data/in/summary_file_plwk7_w-6.7_final.xlsx");
        assert_eq!(p.planning_week, Some(7));
        assert_eq!(p.horizons, vec![6, 7]);
    }

    #[test]
    fn test_parse_ignores_copy_suffixes() {
        let p = parse_filename("summary_file_plwk20_w-2.3.4 (1).xlsx");
        assert_eq!(p.planning_week, Some(20));
        assert_eq!(p.horizons, vec![2, 3, 4]);
        assert!(p.issues.is_empty());

        let p = parse_filename("summary_file_plwk20_w-2.3.4-final.xlsx");
        assert_eq!(p.horizons, vec![2, 3, 4]);
        assert!(p.issues.is_empty());
    }

    #[test]
    fn test_parse_keeps_arbitrary_order() {
        let p = parse_filename("summary_file_plwk3_w-5.1.10.xls");
        assert_eq!(p.horizons, vec![5, 1, 10]);
    }

    #[test]
    fn test_parse_missing_markers() {
        let p = parse_filename("capacity_export.xlsx");
        assert_eq!(p.planning_week, None);
        assert!(p.horizons.is_empty());
        assert_eq!(
            p.issues,
            vec![ParseIssue::MissingPlanningWeek, ParseIssue::MissingHorizons]
        );
    }

    #[test]
    fn test_parse_malformed_horizons() {
        let p = parse_filename("summary_file_plwk12_w-2.x.4.xlsx");
        assert_eq!(p.planning_week, Some(12));
        assert!(p.horizons.is_empty());
        assert_eq!(p.issues, vec![ParseIssue::MalformedHorizons("2.x.4".into())]);

        let p = parse_filename("summary_file_plwk12_w-2..4.xlsx");
        assert!(p.horizons.is_empty());
        assert_eq!(p.issues.len(), 1);
    }

    #[test]
    fn test_parse_out_of_range_values() {
        let p = parse_filename("summary_file_plwk60_w-0.3.11.xlsx");
        assert_eq!(p.planning_week, None);
        assert_eq!(p.horizons, vec![3]);
        assert_eq!(
            p.issues,
            vec![
                ParseIssue::PlanningWeekOutOfRange(60),
                ParseIssue::HorizonOutOfRange(0),
                ParseIssue::HorizonOutOfRange(11),
            ]
        );
    }

    #[test]
    fn test_parse_never_panics() {
        for name in [
            "",
            "w-",
            "plwk",
            "plwk99999999999999999999999_w-99999999999999999999999",
            "ü_plwk5_w-1",
            ".xlsx",
        ] {
            let _ = parse_filename(name);
        }
        assert_eq!(parse_filename("ü_plwk5_w-1").horizons, vec![1]);
    }

    #[test]
    fn test_horizon_token() {
        assert_eq!(horizon_token(2, 2), "2");
        assert_eq!(horizon_token(3, 5), "3.4.5");
        assert_eq!(horizon_token(2, 10), "2.3.4.5.6.7.8.9.10");
    }
}
