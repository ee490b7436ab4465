//! Per-row foreign-currency detection and conversion.
//!
//! A row gains a conversion only when a currency different from the
//! document's local currency is detected in its description and the static
//! rate table carries both codes. The rate is USD-pivoted and one-way;
//! balances stay in the source currency.

use rust_decimal::Decimal;

use ledgerlens_core::catalog::currency as currency_catalog;

/// Result of a row conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// Detected foreign currency (ISO 4217)
    pub original_currency: String,
    /// USD-pivoted cross rate applied
    pub rate: Decimal,
}

/// Detect a foreign currency mentioned in a description.
///
/// Explicit ISO codes win over symbols; a symbol counts only when it sits
/// against a digit (`€45.00`), so narrative text containing symbol letters
/// never triggers a conversion. The document's local currency is never
/// reported as foreign.
pub fn detect_foreign_currency(description: &str, local_currency: &str) -> Option<String> {
    for capture in currency_catalog::ISO_CODE_IN_TEXT.captures_iter(description) {
        let code = capture.get(1).map(|m| m.as_str())?;
        if currency_catalog::is_iso_currency(code) && code != local_currency {
            return Some(code.to_string());
        }
    }
    match symbol_next_to_digit(description) {
        Some(code) if code != local_currency => Some(code.to_string()),
        _ => None,
    }
}

/// First currency symbol adjacent (up to one space) to a digit.
fn symbol_next_to_digit(text: &str) -> Option<&'static str> {
    for &(symbol, code) in currency_catalog::CURRENCY_SYMBOLS.iter() {
        let mut search_from = 0;
        while let Some(found) = text[search_from..].find(symbol) {
            let start = search_from + found;
            let end = start + symbol.len();
            let after_digit = text[end..]
                .chars()
                .take(2)
                .find(|c| *c != ' ')
                .is_some_and(|c| c.is_ascii_digit());
            let before_digit = text[..start]
                .chars()
                .rev()
                .take(2)
                .find(|c| *c != ' ')
                .is_some_and(|c| c.is_ascii_digit());
            if after_digit || before_digit {
                return Some(code);
            }
            search_from = end;
        }
    }
    None
}

/// Convert a magnitude from a foreign currency into the local currency.
///
/// Returns the converted value rounded half-up to 2 decimal places and the
/// applied rate, or `None` when either code is missing from the table.
pub fn convert(value: Decimal, from: &str, to: &str) -> Option<(Decimal, Decimal)> {
    let rate = currency_catalog::cross_rate(from, to)?;
    let converted = (value * rate).round_dp_with_strategy(
        2,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    Some((converted, rate))
}

/// Build a [`Conversion`] when the description names a convertible foreign
/// currency.
pub fn conversion_for_row(description: &str, local_currency: &str) -> Option<Conversion> {
    let original = detect_foreign_currency(description, local_currency)?;
    let rate = currency_catalog::cross_rate(&original, local_currency)?;
    Some(Conversion {
        original_currency: original,
        rate,
    })
}
