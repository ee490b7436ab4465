//! Statement header metadata extracted from the top of page 1.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Statement period covered by the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    /// First day covered
    pub from: NaiveDate,
    /// Last day covered
    pub to: NaiveDate,
}

/// Account metadata recognized above the transaction table.
///
/// Account numbers are masked at construction time; the full number is
/// never stored or emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedStatementHeader {
    /// Account holder name
    pub account_holder: Option<String>,
    /// Masked account number, `****dddd`
    pub account_number_masked: Option<String>,
    /// Statement period start
    pub statement_period_from: Option<NaiveDate>,
    /// Statement period end
    pub statement_period_to: Option<NaiveDate>,
    /// Issuing bank name
    pub bank_name: Option<String>,
    /// Indian IFSC code
    pub ifsc_code: Option<String>,
    /// Branch name
    pub branch_name: Option<String>,
    /// Customer identifier
    pub customer_id: Option<String>,
    /// Statement currency (ISO 4217)
    pub currency: Option<String>,
    /// Australian BSB number
    pub bsb_number: Option<String>,
    /// UK sort code
    pub sort_code: Option<String>,
    /// US ABA routing number
    pub routing_number: Option<String>,
}

impl ExtractedStatementHeader {
    /// Set the account number, masking it to its last four digits.
    ///
    /// Inputs with fewer than four digits are rejected (nothing is stored).
    pub fn set_account_number(&mut self, raw: &str) {
        self.account_number_masked = mask_account_number(raw);
    }

    /// Whether any field was recognized.
    pub fn is_empty(&self) -> bool {
        self.account_holder.is_none()
            && self.account_number_masked.is_none()
            && self.statement_period_from.is_none()
            && self.statement_period_to.is_none()
            && self.bank_name.is_none()
            && self.ifsc_code.is_none()
            && self.branch_name.is_none()
            && self.customer_id.is_none()
            && self.currency.is_none()
            && self.bsb_number.is_none()
            && self.sort_code.is_none()
            && self.routing_number.is_none()
    }
}

/// Mask an account number to `****dddd` (exactly four trailing digits).
///
/// Non-digit characters (spaces, dashes) are ignored when locating the
/// trailing digits. Returns `None` when fewer than four digits exist.
pub fn mask_account_number(raw: &str) -> Option<String> {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let last4: String = digits[digits.len() - 4..].iter().collect();
    Some(format!("****{last4}"))
}
