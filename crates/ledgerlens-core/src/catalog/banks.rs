//! Global bank-name list for statement-header extraction.

use once_cell::sync::Lazy;

/// Known bank names, matched case-insensitively against header lines.
/// Longer names are listed before their substrings so the first hit is the
/// most specific.
pub static BANK_NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // North America
        "JPMorgan Chase",
        "Bank of America",
        "Wells Fargo",
        "Citibank",
        "Capital One",
        "US Bank",
        "PNC Bank",
        "TD Bank",
        "Truist",
        "Royal Bank of Canada",
        "Scotiabank",
        "Bank of Montreal",
        // Europe
        "HSBC",
        "Barclays",
        "Lloyds Bank",
        "NatWest",
        "Santander",
        "Deutsche Bank",
        "Commerzbank",
        "BNP Paribas",
        "Societe Generale",
        "Credit Agricole",
        "UniCredit",
        "Intesa Sanpaolo",
        "ING Bank",
        "ABN AMRO",
        "Rabobank",
        "UBS",
        "Credit Suisse",
        "Nordea",
        "Danske Bank",
        "CaixaBank",
        "BBVA",
        // Asia-Pacific
        "State Bank of India",
        "HDFC Bank",
        "ICICI Bank",
        "Axis Bank",
        "Kotak Mahindra Bank",
        "Punjab National Bank",
        "Bank of Baroda",
        "Yes Bank",
        "IDFC First Bank",
        "DBS Bank",
        "OCBC Bank",
        "United Overseas Bank",
        "Standard Chartered",
        "Commonwealth Bank",
        "Westpac",
        "ANZ Bank",
        "National Australia Bank",
        "Mitsubishi UFJ",
        "Sumitomo Mitsui",
        "Mizuho Bank",
        "Industrial and Commercial Bank of China",
        "China Construction Bank",
        "Bank of China",
        "Hang Seng Bank",
        // Middle East / Africa
        "Emirates NBD",
        "First Abu Dhabi Bank",
        "Qatar National Bank",
        "Standard Bank",
        "FirstRand",
        "Absa Bank",
        "Nedbank",
        "Guaranty Trust Bank",
        "Access Bank",
    ]
});

/// First bank name contained in the text, case-insensitively.
pub fn match_bank_name(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    BANK_NAMES
        .iter()
        .find(|name| lowered.contains(&name.to_lowercase()))
        .copied()
}
