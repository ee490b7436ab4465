//! Date shape catalog.
//!
//! Each pattern pairs a recognition regex with the chrono format strings
//! that can parse it. Order within `formats` encodes ambiguity: for
//! `01/02/2025` the day-first reading comes first and locale detection
//! reorders candidates for month-first locales.

use once_cell::sync::Lazy;
use regex::Regex;

/// One recognizable date shape.
#[derive(Debug)]
pub struct DatePattern {
    /// Canonical key, e.g. `numeric_slash`
    pub name: &'static str,
    /// Recognition regex, anchored
    pub regex: Regex,
    /// chrono format candidates, day-first reading first
    pub formats: &'static [&'static str],
    /// Whether the shape carries a year
    pub has_year: bool,
}

fn pattern(
    name: &'static str,
    re: &str,
    formats: &'static [&'static str],
    has_year: bool,
) -> DatePattern {
    DatePattern {
        name,
        regex: Regex::new(re).expect("date pattern regex"),
        formats,
        has_year,
    }
}

/// All recognizable date shapes, most specific first.
pub static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        pattern("iso", r"^\d{4}-\d{2}-\d{2}$", &["%Y-%m-%d"], true),
        pattern(
            "numeric_slash",
            r"^\d{1,2}/\d{1,2}/\d{4}$",
            &["%d/%m/%Y", "%m/%d/%Y"],
            true,
        ),
        pattern(
            "numeric_slash_short",
            r"^\d{1,2}/\d{1,2}/\d{2}$",
            &["%d/%m/%y", "%m/%d/%y"],
            true,
        ),
        pattern(
            "numeric_dot",
            r"^\d{1,2}\.\d{1,2}\.\d{4}$",
            &["%d.%m.%Y"],
            true,
        ),
        pattern(
            "numeric_dot_short",
            r"^\d{1,2}\.\d{1,2}\.\d{2}$",
            &["%d.%m.%y"],
            true,
        ),
        pattern(
            "numeric_dash",
            r"^\d{1,2}-\d{1,2}-\d{4}$",
            &["%d-%m-%Y", "%m-%d-%Y"],
            true,
        ),
        pattern(
            "text_month_dmy",
            r"(?i)^\d{1,2}[ -](jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[ ,-]+\d{4}$",
            &["%d %b %Y", "%d-%b-%Y", "%d %B %Y", "%d %b, %Y"],
            true,
        ),
        pattern(
            "text_month_mdy",
            r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[ .]+\d{1,2},?[ ]+\d{4}$",
            &["%b %d, %Y", "%b %d %Y", "%B %d, %Y"],
            true,
        ),
        pattern(
            "text_month_no_year",
            r"(?i)^(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[ .]+\d{1,2}$",
            &["%b %d"],
            false,
        ),
        pattern(
            "short_numeric",
            r"^\d{1,2}[/-]\d{1,2}$",
            &["%d/%m", "%m/%d"],
            false,
        ),
    ]
});

/// Whether the trimmed text matches any date shape in the catalog.
pub fn matches_any(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    DATE_PATTERNS.iter().any(|p| p.regex.is_match(trimmed))
}

/// The first matching date shape for the trimmed text.
pub fn matching_pattern(text: &str) -> Option<&'static DatePattern> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_PATTERNS.iter().find(|p| p.regex.is_match(trimmed))
}
