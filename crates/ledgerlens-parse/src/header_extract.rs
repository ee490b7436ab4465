//! Statement-header extraction: account metadata above the table.
//!
//! A regex catalog runs over the first lines of page 1. Account numbers
//! are masked to their last four digits at the moment of extraction; the
//! full number never leaves this function.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use ledgerlens_core::catalog::banks;
use ledgerlens_core::{ExtractedStatementHeader, Line, StageOutcome};

use crate::dates;
use crate::locale::LocaleProfile;

/// How many leading lines of page 1 are scanned.
const HEADER_SCAN_LINES: usize = 30;

static ACCOUNT_HOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:account holder|customer name|in the name of)\s*[:\-]?\s*(.{2,60})")
        .expect("account holder regex")
});
static ACCOUNT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:account|a/c)\s*(?:no|number|#)?\.?\s*[:\-]?\s*([0-9][0-9Xx*\- ]{4,}[0-9])")
        .expect("account number regex")
});
static STATEMENT_PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:statement period|period|statement for)\s*[:\-]?\s*(\S+)\s*(?:to|through|-|–)\s*(\S+)",
    )
    .expect("statement period regex")
});
static FROM_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfrom\s+(\S+)\s+to\s+(\S+)").expect("from-to regex")
});
static IFSC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bIFSC\s*(?:code)?\s*[:\-]?\s*([A-Z]{4}0[A-Z0-9]{6})\b").expect("ifsc regex")
});
static BSB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBSB\s*(?:no|number)?\.?\s*[:\-]?\s*(\d{3}-?\d{3})\b").expect("bsb regex")
});
static SORT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bsort\s*code\s*[:\-]?\s*(\d{2}-\d{2}-\d{2})\b").expect("sort code regex")
});
static ROUTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brouting\s*(?:no|number|#)?\.?\s*[:\-]?\s*(\d{9})\b").expect("routing regex")
});
static CUSTOMER_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcustomer\s*(?:id|no)\.?\s*[:\-]?\s*([A-Za-z0-9]{3,20})\b")
        .expect("customer id regex")
});
static BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbranch\s*(?:name)?\s*[:\-]\s*(.{2,50})").expect("branch regex")
});
static CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcurrency\s*[:\-]?\s*([A-Z]{3})\b").expect("currency regex")
});

/// Extract account metadata from the top of page 1.
///
/// Only the first [`HEADER_SCAN_LINES`] lines of page 1 are considered,
/// matching where real statements place their letterhead.
pub fn extract_statement_header(
    lines: &[Line],
    profile: &LocaleProfile,
) -> StageOutcome<ExtractedStatementHeader> {
    let mut header = ExtractedStatementHeader::default();
    let mut warnings = Vec::new();

    let scan: Vec<String> = lines
        .iter()
        .filter(|l| l.page_number == 1)
        .take(HEADER_SCAN_LINES)
        .map(Line::text)
        .collect();

    for text in &scan {
        if header.bank_name.is_none() {
            header.bank_name = banks::match_bank_name(text).map(str::to_string);
        }
        if header.account_holder.is_none() {
            if let Some(capture) = ACCOUNT_HOLDER.captures(text) {
                header.account_holder = Some(capture[1].trim().to_string());
            }
        }
        if header.account_number_masked.is_none() {
            if let Some(capture) = ACCOUNT_NUMBER.captures(text) {
                header.set_account_number(capture[1].trim());
                if header.account_number_masked.is_none() {
                    warnings.push("account number matched but had fewer than 4 digits".to_string());
                }
            }
        }
        if header.statement_period_from.is_none() {
            let capture = STATEMENT_PERIOD
                .captures(text)
                .or_else(|| FROM_TO.captures(text));
            if let Some(capture) = capture {
                let from = dates::parse_date(&capture[1], profile, None).ok();
                let to = dates::parse_date(&capture[2], profile, None).ok();
                if from.is_none() || to.is_none() {
                    warnings.push(format!(
                        "statement period {:?} to {:?} did not parse as dates",
                        &capture[1], &capture[2]
                    ));
                }
                header.statement_period_from = from;
                header.statement_period_to = to;
            }
        }
        if header.ifsc_code.is_none() {
            if let Some(capture) = IFSC.captures(text) {
                header.ifsc_code = Some(capture[1].to_uppercase());
            }
        }
        if header.bsb_number.is_none() {
            if let Some(capture) = BSB.captures(text) {
                header.bsb_number = Some(capture[1].to_string());
            }
        }
        if header.sort_code.is_none() {
            if let Some(capture) = SORT_CODE.captures(text) {
                header.sort_code = Some(capture[1].to_string());
            }
        }
        if header.routing_number.is_none() {
            if let Some(capture) = ROUTING.captures(text) {
                header.routing_number = Some(capture[1].to_string());
            }
        }
        if header.customer_id.is_none() {
            if let Some(capture) = CUSTOMER_ID.captures(text) {
                header.customer_id = Some(capture[1].to_string());
            }
        }
        if header.branch_name.is_none() {
            if let Some(capture) = BRANCH.captures(text) {
                header.branch_name = Some(capture[1].trim().to_string());
            }
        }
        if header.currency.is_none() {
            if let Some(capture) = CURRENCY.captures(text) {
                header.currency = Some(capture[1].to_uppercase());
            }
        }
    }

    if header.is_empty() && !scan.is_empty() {
        warnings.push("no statement header fields recognized".to_string());
    }

    debug!(
        bank = ?header.bank_name,
        masked = ?header.account_number_masked,
        "extracted statement header"
    );
    StageOutcome::with_warnings(header, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_core::{BoundingBox, TextFragment};

    fn line(text: &str, y: f64) -> Line {
        Line::new(vec![TextFragment::native(
            text,
            BoundingBox::new(0.0, y, 400.0, 10.0).unwrap(),
            1,
        )])
        .unwrap()
    }

    fn us() -> LocaleProfile {
        LocaleProfile::us_english()
    }

    #[test]
    fn test_full_header_block() {
        let lines = vec![
            line("HDFC Bank Statement of Account", 10.0),
            line("Account Holder: JANE EXAMPLE", 25.0),
            line("Account No: 5010 0234 5678 9012", 40.0),
            line("Statement Period: 2025-01-01 to 2025-01-31", 55.0),
            line("IFSC Code: HDFC0001234  Branch: MG Road", 70.0),
            line("Customer ID: CU992817 Currency: INR", 85.0),
        ];
        let outcome = extract_statement_header(&lines, &us());
        let header = outcome.output;
        assert_eq!(header.bank_name.as_deref(), Some("HDFC Bank"));
        assert_eq!(header.account_holder.as_deref(), Some("JANE EXAMPLE"));
        assert_eq!(header.account_number_masked.as_deref(), Some("****9012"));
        assert_eq!(
            header.statement_period_from,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(
            header.statement_period_to,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert_eq!(header.ifsc_code.as_deref(), Some("HDFC0001234"));
        assert_eq!(header.customer_id.as_deref(), Some("CU992817"));
        assert_eq!(header.currency.as_deref(), Some("INR"));
    }

    #[test]
    fn test_full_account_number_never_in_output() {
        let lines = vec![line("Account Number: 123456789012", 10.0)];
        let outcome = extract_statement_header(&lines, &us());
        let serialized = serde_json::to_string(&outcome.output).unwrap();
        assert!(!serialized.contains("123456789012"));
        assert!(serialized.contains("****9012"));
    }

    #[test]
    fn test_uk_us_au_identifiers() {
        let lines = vec![
            line("Sort Code: 20-00-00", 10.0),
            line("Routing Number: 021000021", 25.0),
            line("BSB No: 062-000", 40.0),
        ];
        let outcome = extract_statement_header(&lines, &us());
        assert_eq!(outcome.output.sort_code.as_deref(), Some("20-00-00"));
        assert_eq!(outcome.output.routing_number.as_deref(), Some("021000021"));
        assert_eq!(outcome.output.bsb_number.as_deref(), Some("062-000"));
    }

    #[test]
    fn test_pages_beyond_one_ignored() {
        let mut late = line("Account No: 99887766", 10.0);
        late.fragments[0].page_number = 2;
        let late = Line::new(late.fragments).unwrap();
        let outcome = extract_statement_header(&[late], &us());
        assert!(outcome.output.account_number_masked.is_none());
    }

    #[test]
    fn test_nothing_recognized_warns() {
        let lines = vec![line("Lorem ipsum dolor", 10.0)];
        let outcome = extract_statement_header(&lines, &us());
        assert!(outcome.output.is_empty());
        assert!(!outcome.warnings.is_empty());
    }
}
