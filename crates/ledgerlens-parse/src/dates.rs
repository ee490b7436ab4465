//! Locale-aware date parsing.
//!
//! Candidate chrono formats come from the shape catalog; the detected
//! locale decides whether day-first or month-first readings go first. The
//! first format that yields a valid calendar date wins and the output is
//! an ISO `NaiveDate`.

use chrono::NaiveDate;

use ledgerlens_core::catalog::dates as date_catalog;
use ledgerlens_core::{EngineError, EngineResult};

use crate::locale::LocaleProfile;

/// Whether the trimmed text matches any known date shape.
pub fn is_date(text: &str) -> bool {
    date_catalog::matches_any(text)
}

/// Parse a raw date cell into a calendar date.
///
/// `reference_year` supplies the year for year-less shapes (`15/01`,
/// `Jan 15`); without it such shapes fail rather than guess.
pub fn parse_date(
    text: &str,
    profile: &LocaleProfile,
    reference_year: Option<i32>,
) -> EngineResult<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::parse("empty date cell"));
    }
    let pattern = date_catalog::matching_pattern(trimmed)
        .ok_or_else(|| EngineError::parse(format!("unrecognized date shape {trimmed:?}")))?;

    let mut formats: Vec<&str> = pattern.formats.to_vec();
    if !profile.day_first && formats.len() > 1 {
        // Month-first locales try the month-first reading first
        formats.reverse();
    }

    if pattern.has_year {
        for format in &formats {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date);
            }
        }
        return Err(EngineError::parse(format!(
            "date {trimmed:?} matched shape {} but no format parsed it",
            pattern.name
        )));
    }

    let year = reference_year.ok_or_else(|| {
        EngineError::parse(format!(
            "date {trimmed:?} has no year and no statement period supplies one"
        ))
    })?;
    for format in &formats {
        let with_year = format!("{trimmed} {year}");
        let format_with_year = format!("{format} %Y");
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format_with_year) {
            return Ok(date);
        }
    }
    Err(EngineError::parse(format!(
        "date {trimmed:?} could not be parsed with reference year {year}"
    )))
}

/// Serialize a date back to the engine's canonical ISO form.
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
