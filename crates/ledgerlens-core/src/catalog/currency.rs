//! Currency catalog: symbols, ISO codes, and the static USD-pivot rate table.
//!
//! Rates are injected constants (units of currency per 1 USD); the engine
//! never fetches rates. Cross rates derive through the USD pivot only.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Currency symbol or prefix -> ISO 4217 code.
///
/// Multi-character symbols are listed before their prefixes so that a
/// longest-match scan resolves `R$` to BRL, not ZAR.
pub static CURRENCY_SYMBOLS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("R$", "BRL"),
        ("A$", "AUD"),
        ("C$", "CAD"),
        ("S$", "SGD"),
        ("HK$", "HKD"),
        ("NZ$", "NZD"),
        ("US$", "USD"),
        ("CHF", "CHF"),
        ("kr", "SEK"),
        ("zł", "PLN"),
        ("₹", "INR"),
        ("₩", "KRW"),
        ("₺", "TRY"),
        ("₽", "RUB"),
        ("₪", "ILS"),
        ("₱", "PHP"),
        ("฿", "THB"),
        ("€", "EUR"),
        ("£", "GBP"),
        ("¥", "JPY"),
        ("$", "USD"),
        ("R", "ZAR"),
    ]
});

/// Valid ISO 4217 codes recognized by the engine.
pub static ISO_CURRENCIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "CNY", "HKD", "SGD", "INR", "BRL",
        "MXN", "KRW", "RUB", "ZAR", "SEK", "NOK", "DKK", "NZD", "THB", "MYR", "IDR", "PHP",
        "AED", "SAR", "TRY", "PLN", "CZK", "HUF", "ILS", "EGP", "NGN", "KES", "PKR", "BDT",
        "LKR", "VND",
    ]
    .into_iter()
    .collect()
});

/// Static exchange-rate table: units of currency per 1 USD.
pub static USD_RATES: Lazy<HashMap<&'static str, Decimal>> = Lazy::new(|| {
    HashMap::from([
        ("USD", dec!(1.0)),
        ("EUR", dec!(0.92)),
        ("GBP", dec!(0.79)),
        ("JPY", dec!(149.50)),
        ("CHF", dec!(0.88)),
        ("CAD", dec!(1.36)),
        ("AUD", dec!(1.52)),
        ("CNY", dec!(7.24)),
        ("HKD", dec!(7.82)),
        ("SGD", dec!(1.34)),
        ("INR", dec!(83.20)),
        ("BRL", dec!(4.97)),
        ("MXN", dec!(17.15)),
        ("KRW", dec!(1330.0)),
        ("ZAR", dec!(18.70)),
        ("SEK", dec!(10.45)),
        ("NOK", dec!(10.60)),
        ("DKK", dec!(6.88)),
        ("NZD", dec!(1.64)),
        ("THB", dec!(35.60)),
        ("MYR", dec!(4.72)),
        ("PHP", dec!(55.90)),
        ("AED", dec!(3.67)),
        ("SAR", dec!(3.75)),
        ("TRY", dec!(30.20)),
        ("PLN", dec!(3.98)),
        ("ILS", dec!(3.65)),
        ("PKR", dec!(278.50)),
    ])
});

/// Regex finding explicit ISO codes in free text, e.g. `EUR 45.00`.
pub static ISO_CODE_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{3})\b").expect("iso code regex"));

/// Whether the code is a known ISO 4217 currency.
pub fn is_iso_currency(code: &str) -> bool {
    ISO_CURRENCIES.contains(code)
}

/// USD-pivot rate for a code, when the table carries it.
pub fn usd_rate(code: &str) -> Option<Decimal> {
    USD_RATES.get(code).copied()
}

/// One-way cross rate from `from` to `to` through the USD pivot.
///
/// `amount_to = amount_from * cross_rate(from, to)`.
pub fn cross_rate(from: &str, to: &str) -> Option<Decimal> {
    let from_rate = usd_rate(from)?;
    let to_rate = usd_rate(to)?;
    if from_rate.is_zero() {
        return None;
    }
    Some(to_rate / from_rate)
}

/// Longest currency symbol at the start or end of the text, if any.
pub fn detect_symbol(text: &str) -> Option<&'static str> {
    let trimmed = text.trim();
    CURRENCY_SYMBOLS
        .iter()
        .find(|(symbol, _)| trimmed.starts_with(symbol) || trimmed.ends_with(symbol))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_longest_match() {
        assert_eq!(detect_symbol("R$ 120,00"), Some("BRL"));
        assert_eq!(detect_symbol("R 120.00"), Some("ZAR"));
        assert_eq!(detect_symbol("$120.00"), Some("USD"));
        assert_eq!(detect_symbol("€1.234,56"), Some("EUR"));
        assert_eq!(detect_symbol("120.00"), None);
    }

    #[test]
    fn test_cross_rate_pivots_through_usd() {
        let eur_to_inr = cross_rate("EUR", "INR").unwrap();
        let expected = usd_rate("INR").unwrap() / usd_rate("EUR").unwrap();
        assert_eq!(eur_to_inr, expected);
        assert_eq!(cross_rate("USD", "USD").unwrap(), dec!(1.0));
    }

    #[test]
    fn test_unknown_codes() {
        assert!(cross_rate("EUR", "XXX").is_none());
        assert!(!is_iso_currency("XXX"));
        assert!(is_iso_currency("INR"));
    }
}
