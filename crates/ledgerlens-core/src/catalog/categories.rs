//! Spending-category pattern library.
//!
//! Fixed regex patterns scored against transaction descriptions. Highest
//! confidence wins; ties go to the longer match.

use once_cell::sync::Lazy;
use regex::Regex;

/// One category pattern.
#[derive(Debug)]
pub struct CategoryPattern {
    /// Category name, e.g. `Transfer`
    pub name: &'static str,
    /// Match regex, case-insensitive
    pub regex: Regex,
    /// Base confidence when the pattern matches, 0..=1
    pub confidence: f64,
}

fn pattern(name: &'static str, re: &str, confidence: f64) -> CategoryPattern {
    CategoryPattern {
        name,
        regex: Regex::new(&format!("(?i){re}")).expect("category pattern regex"),
        confidence,
    }
}

/// The fixed category library.
pub static CATEGORY_PATTERNS: Lazy<Vec<CategoryPattern>> = Lazy::new(|| {
    vec![
        pattern("Salary", r"\b(salary|payroll|wages|sal cr|direct deposit)\b", 0.95),
        pattern("Transfer", r"\b(transfer|neft|rtgs|imps|upi|wire|zelle|sepa|ach|standing order|std order)\b", 0.9),
        pattern("ATM", r"\b(atm|cash withdrawal|cash wdl|cardless cash)\b", 0.95),
        pattern("Cash Deposit", r"\b(cash deposit|cash dep|cdm deposit)\b", 0.9),
        pattern("Utilities", r"\b(electric|electricity|water bill|gas bill|power bill|utility|broadband|internet bill|telecom|mobile recharge)\b", 0.85),
        pattern("Groceries", r"\b(grocery|supermarket|walmart|kroger|aldi|lidl|tesco|sainsbury|whole foods|trader joe)\b", 0.85),
        pattern("Dining", r"\b(restaurant|cafe|coffee|starbucks|mcdonald|burger|pizza|doordash|ubereats|grubhub|deliveroo)\b", 0.85),
        pattern("Fuel", r"\b(fuel|petrol|gas station|shell|chevron|exxon|bp)\b", 0.8),
        pattern("Shopping", r"\b(amazon|ebay|flipkart|target|costco|retail|purchase|pos )\b", 0.7),
        pattern("Rent", r"\b(rent|lease payment|landlord)\b", 0.85),
        pattern("Mortgage", r"\b(mortgage|home loan)\b", 0.9),
        pattern("Insurance", r"\b(insurance|premium|policy)\b", 0.8),
        pattern("Loan Payment", r"\b(loan|emi|installment|instalment|repayment)\b", 0.8),
        pattern("Fees", r"\b(fee|charge|charges|commission|penalty|service chg)\b", 0.75),
        pattern("Interest", r"\b(interest|int\.? (paid|earned|credit))\b", 0.85),
        pattern("Tax", r"\b(tax|tds|irs|hmrc|vat)\b", 0.8),
        pattern("Subscription", r"\b(netflix|spotify|subscription|prime|hulu|disney)\b", 0.85),
        pattern("Healthcare", r"\b(pharmacy|hospital|clinic|medical|doctor|dental)\b", 0.8),
        pattern("Travel", r"\b(airline|flight|hotel|airbnb|uber|lyft|taxi|railway|train ticket)\b", 0.8),
        pattern("Education", r"\b(tuition|school fee|university|college|course)\b", 0.8),
        pattern("Entertainment", r"\b(cinema|movie|theatre|concert|gaming|steam)\b", 0.75),
    ]
});

/// Best category for a description: highest confidence, ties broken by the
/// longer match. Returns `(name, confidence)`.
pub fn best_match(description: &str) -> Option<(&'static str, f64)> {
    let mut best: Option<(&'static str, f64, usize)> = None;
    for pattern in CATEGORY_PATTERNS.iter() {
        if let Some(found) = pattern.regex.find(description) {
            let len = found.len();
            let better = match best {
                None => true,
                Some((_, conf, best_len)) => {
                    pattern.confidence > conf || (pattern.confidence == conf && len > best_len)
                }
            };
            if better {
                best = Some((pattern.name, pattern.confidence, len));
            }
        }
    }
    best.map(|(name, conf, _)| (name, conf))
}
