//! Locale and number-format detection.
//!
//! The locale is inferred from three signals, strongest first: script
//! markers in the sampled text (Arabic, CJK, Devanagari), the language of
//! recognized column headers, and the shape of sampled numeric values
//! (European `1.234,56` vs US `1,234.56`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgerlens_core::catalog::headers;
use ledgerlens_core::StageOutcome;

/// Where the currency symbol sits relative to the number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyPosition {
    /// `$1,234.56`
    #[default]
    Prefix,
    /// `1.234,56 €`
    Suffix,
}

/// Detected numeric formatting conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFormat {
    /// Thousands separator
    pub thousands_sep: char,
    /// Decimal separator
    pub decimal_sep: char,
    /// Currency symbol seen in samples, if any
    pub currency_symbol: Option<String>,
    /// Symbol position
    pub currency_position: CurrencyPosition,
}

impl NumberFormat {
    /// US-style `1,234.56`.
    pub fn us() -> Self {
        Self {
            thousands_sep: ',',
            decimal_sep: '.',
            currency_symbol: None,
            currency_position: CurrencyPosition::Prefix,
        }
    }

    /// European `1.234,56`.
    pub fn european() -> Self {
        Self {
            thousands_sep: '.',
            decimal_sep: ',',
            currency_symbol: None,
            currency_position: CurrencyPosition::Suffix,
        }
    }

    /// French variant `1 234,56` (space thousands).
    pub fn french() -> Self {
        Self {
            thousands_sep: ' ',
            decimal_sep: ',',
            currency_symbol: None,
            currency_position: CurrencyPosition::Suffix,
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::us()
    }
}

/// Detected locale profile driving number and date parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleProfile {
    /// BCP-47-ish locale code, e.g. `de-DE`
    pub locale: String,
    /// Numeric conventions
    pub number_format: NumberFormat,
    /// Whether day-first date readings outrank month-first
    pub day_first: bool,
    /// Right-to-left script detected
    pub rtl: bool,
}

impl LocaleProfile {
    /// The engine's fallback profile: US English.
    pub fn us_english() -> Self {
        Self {
            locale: "en-US".to_string(),
            number_format: NumberFormat::us(),
            day_first: false,
            rtl: false,
        }
    }

    /// Build a profile from an explicit locale code.
    pub fn from_code(code: &str) -> Self {
        let lower = code.to_lowercase();
        let (number_format, day_first) = match lower.split('-').next().unwrap_or("") {
            "en" if lower == "en-us" => (NumberFormat::us(), false),
            "en" => (NumberFormat::us(), true),
            "fr" => (NumberFormat::french(), true),
            "de" | "es" | "it" | "pt" | "nl" => (NumberFormat::european(), true),
            "hi" => (NumberFormat::us(), true),
            "ar" => (NumberFormat::us(), true),
            "zh" | "ja" => (NumberFormat::us(), false),
            _ => (NumberFormat::us(), false),
        };
        Self {
            locale: code.to_string(),
            number_format,
            day_first,
            rtl: lower.starts_with("ar"),
        }
    }
}

static EUROPEAN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:\.\d{3})+,\d{2}\b").expect("european number regex"));
static FRENCH_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:\x20\d{3})+,\d{2}\b").expect("french number regex"));
static PLAIN_COMMA_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+,\d{2}$").expect("comma decimal regex"));

fn has_script(text: &str, range: impl Fn(char) -> bool) -> bool {
    text.chars().any(range)
}

/// Infer locale and number format from header strings and numeric samples.
///
/// `headers` are the texts of recognized header cells; `numeric_samples`
/// are raw cell texts from monetary columns.
pub fn detect_locale(
    header_texts: &[String],
    numeric_samples: &[String],
) -> StageOutcome<LocaleProfile> {
    let mut warnings = Vec::new();
    let all_text: String = header_texts.join(" ");

    // Script markers are decisive
    if has_script(&all_text, |c| ('\u{0600}'..='\u{06FF}').contains(&c)) {
        return StageOutcome::clean(LocaleProfile {
            locale: "ar-SA".to_string(),
            number_format: NumberFormat::us(),
            day_first: true,
            rtl: true,
        });
    }
    if has_script(&all_text, |c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return StageOutcome::clean(LocaleProfile {
            locale: "hi-IN".to_string(),
            number_format: NumberFormat::us(),
            day_first: true,
            rtl: false,
        });
    }
    if has_script(&all_text, |c| {
        ('\u{3040}'..='\u{30FF}').contains(&c) // hiragana + katakana
    }) {
        return StageOutcome::clean(LocaleProfile {
            locale: "ja-JP".to_string(),
            number_format: NumberFormat::us(),
            day_first: false,
            rtl: false,
        });
    }
    if has_script(&all_text, |c| ('\u{4E00}'..='\u{9FFF}').contains(&c)) {
        return StageOutcome::clean(LocaleProfile {
            locale: "zh-CN".to_string(),
            number_format: NumberFormat::us(),
            day_first: false,
            rtl: false,
        });
    }

    // Header language vote
    let mut language_votes: std::collections::HashMap<&str, usize> =
        std::collections::HashMap::new();
    for header in header_texts {
        if let Some(entry) = headers::lookup_fuzzy(header) {
            *language_votes.entry(entry.language).or_insert(0) += 1;
        }
    }
    let header_language = language_votes
        .into_iter()
        .max_by_key(|&(language, votes)| (votes, std::cmp::Reverse(language)))
        .map(|(language, _)| language);

    // Numeric shape vote
    let euro_hits = numeric_samples
        .iter()
        .filter(|s| EUROPEAN_NUMBER.is_match(s) || PLAIN_COMMA_DECIMAL.is_match(s.trim()))
        .count();
    let french_hits = numeric_samples
        .iter()
        .filter(|s| FRENCH_NUMBER.is_match(s))
        .count();
    let us_hits = numeric_samples
        .iter()
        .filter(|s| s.contains('.') && !EUROPEAN_NUMBER.is_match(s))
        .count();

    let profile = match header_language {
        Some("de") => LocaleProfile::from_code("de-DE"),
        Some("fr") => LocaleProfile::from_code("fr-FR"),
        Some("es") => LocaleProfile::from_code("es-ES"),
        Some("it") => LocaleProfile::from_code("it-IT"),
        Some("pt") => LocaleProfile::from_code("pt-BR"),
        Some("nl") => LocaleProfile::from_code("nl-NL"),
        Some("hi") => LocaleProfile::from_code("hi-IN"),
        Some("en") | None => {
            // Fall back to numeric shape
            if french_hits > 0 && french_hits >= euro_hits {
                LocaleProfile::from_code("fr-FR")
            } else if euro_hits > us_hits {
                LocaleProfile::from_code("de-DE")
            } else {
                if header_language.is_none() && numeric_samples.is_empty() {
                    warnings.push("no locale signals; defaulting to en-US".to_string());
                }
                LocaleProfile::us_english()
            }
        }
        Some(other) => {
            warnings.push(format!("unrecognized header language {other:?}"));
            LocaleProfile::us_english()
        }
    };

    // A European header language with US-shaped numbers is suspicious
    if matches!(header_language, Some("de" | "fr" | "es" | "it" | "pt" | "nl"))
        && us_hits > euro_hits + french_hits
        && us_hits > 0
    {
        warnings.push(format!(
            "header language {:?} disagrees with numeric shape; keeping header vote",
            header_language.unwrap_or_default()
        ));
    }

    debug!(locale = %profile.locale, day_first = profile.day_first, "detected locale");
    StageOutcome::with_warnings(profile, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_us_default() {
        let outcome = detect_locale(
            &strings(&["Date", "Description", "Debit", "Credit", "Balance"]),
            &strings(&["1,234.56", "89.99"]),
        );
        assert_eq!(outcome.output.locale, "en-US");
        assert!(!outcome.output.day_first);
        assert_eq!(outcome.output.number_format.decimal_sep, '.');
    }

    #[test]
    fn test_german_headers() {
        let outcome = detect_locale(
            &strings(&["Buchungstag", "Verwendungszweck", "Soll", "Haben", "Saldo"]),
            &strings(&["1.234,56"]),
        );
        assert_eq!(outcome.output.locale, "de-DE");
        assert!(outcome.output.day_first);
        assert_eq!(outcome.output.number_format.decimal_sep, ',');
        assert_eq!(outcome.output.number_format.thousands_sep, '.');
    }

    #[test]
    fn test_european_numbers_without_headers() {
        let outcome = detect_locale(&[], &strings(&["1.234,56", "11.250,00"]));
        assert_eq!(outcome.output.number_format.decimal_sep, ',');
    }

    #[test]
    fn test_french_space_thousands() {
        let outcome = detect_locale(&[], &strings(&["1 234,56", "12 450,00"]));
        assert_eq!(outcome.output.locale, "fr-FR");
        assert_eq!(outcome.output.number_format.thousands_sep, ' ');
    }

    #[test]
    fn test_arabic_script_sets_rtl() {
        let outcome = detect_locale(&strings(&["التاريخ", "الوصف"]), &[]);
        assert!(outcome.output.rtl);
        assert!(outcome.output.locale.starts_with("ar"));
    }

    #[test]
    fn test_devanagari_script() {
        let outcome = detect_locale(&strings(&["दिनांक", "विवरण"]), &[]);
        assert_eq!(outcome.output.locale, "hi-IN");
    }

    #[test]
    fn test_no_signals_warns() {
        let outcome = detect_locale(&[], &[]);
        assert_eq!(outcome.output.locale, "en-US");
        assert!(!outcome.warnings.is_empty());
    }
}
