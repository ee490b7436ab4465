//! Locale-aware amount parsing.
//!
//! Amounts come out as non-negative magnitudes plus explicit sign and
//! DR/CR suffix markers; the caller decides which column the value lands
//! in. Magnitudes are never altered after parsing.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerlens_core::catalog::currency::CURRENCY_SYMBOLS;
use ledgerlens_core::{EngineError, EngineResult};

use crate::locale::NumberFormat;

/// DR/CR marker attached to a merged-amount cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSuffix {
    /// Debit marker
    Dr,
    /// Credit marker
    Cr,
}

/// A parsed amount: magnitude, sign, and markers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAmount {
    /// Non-negative magnitude
    pub value: Decimal,
    /// Minus sign or parentheses were present
    pub negative: bool,
    /// DR/CR suffix, when present
    pub suffix: Option<AmountSuffix>,
    /// Currency symbol resolved to an ISO code, when present
    pub currency: Option<&'static str>,
}

static DR_CR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(dr|cr)\.?\s*$").expect("dr/cr suffix regex"));
static ONLY_OTHER_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.,]\d{1,2}$").expect("lenient decimal regex"));

/// Whether the text parses as an amount under the given format.
pub fn is_amount(text: &str, format: &NumberFormat) -> bool {
    parse_amount(text, format).is_ok()
}

/// Parse a raw cell into a [`ParsedAmount`].
///
/// Handles currency symbols (either side), `DR`/`CR` suffixes,
/// parenthesized and signed negatives, and the detected thousands/decimal
/// separators. A cell whose only separator is the *other* convention's
/// decimal (`89.99` in a `1.234,56` document) is read leniently as a
/// decimal rather than as thousands.
pub fn parse_amount(text: &str, format: &NumberFormat) -> EngineResult<ParsedAmount> {
    let mut working = text.trim().to_string();
    if working.is_empty() {
        return Err(EngineError::parse("empty amount cell"));
    }

    // Parentheses denote negation
    let mut negative = false;
    if working.starts_with('(') && working.ends_with(')') {
        negative = true;
        working = working[1..working.len() - 1].trim().to_string();
    }

    // DR/CR suffix
    let mut suffix = None;
    let suffix_match = DR_CR_SUFFIX
        .find(&working)
        .map(|found| (found.start(), found.as_str().trim().trim_end_matches('.').to_lowercase()));
    if let Some((start, marker)) = suffix_match {
        suffix = Some(if marker == "dr" {
            AmountSuffix::Dr
        } else {
            AmountSuffix::Cr
        });
        working.truncate(start);
        while working.ends_with(' ') {
            working.pop();
        }
    }

    // Currency symbols on either side
    let mut currency = None;
    for &(symbol, code) in CURRENCY_SYMBOLS.iter() {
        if let Some(rest) = working.strip_prefix(symbol) {
            currency = Some(code);
            working = rest.trim().to_string();
            break;
        }
        if let Some(rest) = working.strip_suffix(symbol) {
            currency = Some(code);
            working = rest.trim().to_string();
            break;
        }
    }

    // Leading or trailing sign
    if let Some(rest) = working.strip_prefix('-') {
        negative = true;
        working = rest.trim().to_string();
    } else if let Some(rest) = working.strip_suffix('-') {
        negative = true;
        working = rest.trim().to_string();
    } else if let Some(rest) = working.strip_prefix('+') {
        working = rest.trim().to_string();
    }

    if working.is_empty() {
        return Err(EngineError::parse(format!("no digits in amount {text:?}")));
    }

    let normalized = normalize_separators(&working, format)?;
    let value = Decimal::from_str(&normalized)
        .map_err(|e| EngineError::parse(format!("unparseable amount {text:?}: {e}")))?;

    Ok(ParsedAmount {
        value,
        negative,
        suffix,
        currency,
    })
}

/// Collapse thousands separators and normalize the decimal point.
fn normalize_separators(text: &str, format: &NumberFormat) -> EngineResult<String> {
    // Lenient single-separator case: `89.99` under European format or
    // `89,99` under US format is a decimal, not thousands
    if !text.contains(format.decimal_sep) && ONLY_OTHER_DECIMAL.is_match(text) {
        return Ok(text.replace([',', '.'], ".").replace(' ', ""));
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == format.thousands_sep || c == '\u{00A0}' {
            continue;
        }
        if c == format.decimal_sep {
            out.push('.');
            continue;
        }
        if c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        return Err(EngineError::parse(format!(
            "unexpected character {c:?} in amount {text:?}"
        )));
    }
    if out.is_empty() || !out.chars().any(|c| c.is_ascii_digit()) {
        return Err(EngineError::parse(format!("no digits in amount {text:?}")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_us_format() {
        let format = NumberFormat::us();
        assert_eq!(parse_amount("1,234.56", &format).unwrap().value, dec!(1234.56));
        assert_eq!(parse_amount("89.99", &format).unwrap().value, dec!(89.99));
        assert_eq!(parse_amount("5,250.00", &format).unwrap().value, dec!(5250.00));
    }

    #[test]
    fn test_european_format() {
        let format = NumberFormat::european();
        assert_eq!(parse_amount("1.234,56", &format).unwrap().value, dec!(1234.56));
        assert_eq!(parse_amount("11.250,00", &format).unwrap().value, dec!(11250.00));
    }

    #[test]
    fn test_format_equivalence() {
        // "1.234,56" European == "1,234.56" US == 1234.56
        let eu = parse_amount("1.234,56", &NumberFormat::european()).unwrap();
        let us = parse_amount("1,234.56", &NumberFormat::us()).unwrap();
        assert_eq!(eu.value, us.value);
        assert_eq!(eu.value, dec!(1234.56));
    }

    #[test]
    fn test_french_space_thousands() {
        let format = NumberFormat::french();
        assert_eq!(parse_amount("1 234,56", &format).unwrap().value, dec!(1234.56));
    }

    #[test]
    fn test_lenient_other_decimal() {
        // A bare `89.99` inside a European document is a decimal
        let format = NumberFormat::european();
        assert_eq!(parse_amount("89.99", &format).unwrap().value, dec!(89.99));
        // And `89,99` inside a US document likewise
        let format = NumberFormat::us();
        assert_eq!(parse_amount("89,99", &format).unwrap().value, dec!(89.99));
    }

    #[test]
    fn test_negatives() {
        let format = NumberFormat::us();
        let parens = parse_amount("(120.00)", &format).unwrap();
        assert!(parens.negative);
        assert_eq!(parens.value, dec!(120.00));

        let minus = parse_amount("-120.00", &format).unwrap();
        assert!(minus.negative);

        let trailing = parse_amount("120.00-", &format).unwrap();
        assert!(trailing.negative);

        let plus = parse_amount("+120.00", &format).unwrap();
        assert!(!plus.negative);
    }

    #[test]
    fn test_dr_cr_suffixes() {
        let format = NumberFormat::us();
        let dr = parse_amount("1,200.00 DR", &format).unwrap();
        assert_eq!(dr.suffix, Some(AmountSuffix::Dr));
        assert_eq!(dr.value, dec!(1200.00));

        let cr = parse_amount("5,250.00CR", &format).unwrap();
        assert_eq!(cr.suffix, Some(AmountSuffix::Cr));

        let dotted = parse_amount("450.00 Cr.", &format).unwrap();
        assert_eq!(dotted.suffix, Some(AmountSuffix::Cr));
    }

    #[test]
    fn test_currency_symbols() {
        let format = NumberFormat::us();
        let dollars = parse_amount("$1,234.56", &format).unwrap();
        assert_eq!(dollars.currency, Some("USD"));
        assert_eq!(dollars.value, dec!(1234.56));

        let euros = parse_amount("1.234,56 €", &NumberFormat::european()).unwrap();
        assert_eq!(euros.currency, Some("EUR"));

        let rupees = parse_amount("₹83,000.00", &format).unwrap();
        assert_eq!(rupees.currency, Some("INR"));
    }

    #[test]
    fn test_rejects_non_amounts() {
        let format = NumberFormat::us();
        assert!(parse_amount("", &format).is_err());
        assert!(parse_amount("SALARY", &format).is_err());
        assert!(parse_amount("2025-01-15", &format).is_err());
        assert!(parse_amount("--", &format).is_err());
    }

    #[test]
    fn test_magnitude_is_non_negative() {
        let format = NumberFormat::us();
        for sample in ["(99.50)", "-99.50", "99.50"] {
            let parsed = parse_amount(sample, &format).unwrap();
            assert!(parsed.value >= Decimal::ZERO);
        }
    }

    fn group_thousands(units: u64, separator: char) -> String {
        let digits = units.to_string();
        let mut out = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(separator);
            }
            out.push(c);
        }
        out
    }

    proptest::proptest! {
        /// The same value renders differently per format but parses
        /// identically (R3 generalized).
        #[test]
        fn prop_us_and_european_renderings_agree(
            units in 0u64..100_000_000,
            cents in 0u32..100,
        ) {
            let us_text = format!("{}.{:02}", group_thousands(units, ','), cents);
            let eu_text = format!("{},{:02}", group_thousands(units, '.'), cents);
            let us = parse_amount(&us_text, &NumberFormat::us()).unwrap();
            let eu = parse_amount(&eu_text, &NumberFormat::european()).unwrap();
            proptest::prop_assert_eq!(us.value, eu.value);
        }

        /// Parenthesized renderings negate without touching the magnitude.
        #[test]
        fn prop_parentheses_preserve_magnitude(units in 0u64..1_000_000, cents in 0u32..100) {
            let format = NumberFormat::us();
            let plain = format!("{}.{:02}", group_thousands(units, ','), cents);
            let wrapped = format!("({plain})");
            let a = parse_amount(&plain, &format).unwrap();
            let b = parse_amount(&wrapped, &format).unwrap();
            proptest::prop_assert_eq!(a.value, b.value);
            proptest::prop_assert!(!a.negative);
            proptest::prop_assert!(b.negative);
        }
    }
}
