//! Multilingual column-header dictionary.
//!
//! Maps normalized header text to a canonical column role. Keys are
//! lowercase with collapsed whitespace; lookup normalizes the same way.
//! Coverage follows the layouts seen in real statements: English, German,
//! French, Spanish, Italian, Portuguese, Dutch, plus common Indian-English
//! and abbreviation variants.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::models::ColumnType;

/// A dictionary entry: header keyword, role, and the language it came from.
#[derive(Debug, Clone, Copy)]
pub struct HeaderEntry {
    /// Canonical column role
    pub column_type: ColumnType,
    /// BCP-47-ish language tag, used as a locale hint
    pub language: &'static str,
}

fn insert(map: &mut HashMap<&'static str, HeaderEntry>, keys: &[&'static str], column_type: ColumnType, language: &'static str) {
    for key in keys {
        map.insert(key, HeaderEntry { column_type, language });
    }
}

/// Normalized header keyword -> role.
pub static HEADER_DICTIONARY: Lazy<HashMap<&'static str, HeaderEntry>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // English
    insert(&mut map, &["date", "txn date", "transaction date", "posting date", "post date", "posted", "book date", "entry date"], ColumnType::Date, "en");
    insert(&mut map, &["value date", "val date", "val. date", "interest date"], ColumnType::ValueDate, "en");
    insert(&mut map, &["description", "narration", "narrative", "particulars", "details", "transaction details", "transaction description", "memo", "payee", "remarks"], ColumnType::Description, "en");
    insert(&mut map, &["debit", "debits", "debit amount", "withdrawal", "withdrawals", "withdrawal amt", "money out", "paid out", "out", "dr", "dr amount", "payments", "charges"], ColumnType::Debit, "en");
    insert(&mut map, &["credit", "credits", "credit amount", "deposit", "deposits", "deposit amt", "money in", "paid in", "in", "cr", "cr amount", "receipts"], ColumnType::Credit, "en");
    insert(&mut map, &["balance", "running balance", "closing balance", "available balance", "ledger balance", "bal", "balance amount"], ColumnType::Balance, "en");
    insert(&mut map, &["amount", "amt", "transaction amount", "value"], ColumnType::Amount, "en");
    insert(&mut map, &["reference", "ref", "ref no", "ref no.", "reference no", "cheque no", "cheque no.", "chq no", "chq/ref no", "check no", "cheque number", "doc no", "transaction id", "utr no"], ColumnType::Reference, "en");

    // German
    insert(&mut map, &["datum", "buchungstag", "buchungsdatum", "buchung"], ColumnType::Date, "de");
    insert(&mut map, &["wertstellung", "valuta", "wert"], ColumnType::ValueDate, "de");
    insert(&mut map, &["verwendungszweck", "buchungstext", "umsatzdetails", "beschreibung", "vorgang"], ColumnType::Description, "de");
    insert(&mut map, &["soll", "lastschrift", "belastung", "ausgang", "abgang"], ColumnType::Debit, "de");
    insert(&mut map, &["haben", "gutschrift", "eingang", "zugang"], ColumnType::Credit, "de");
    insert(&mut map, &["saldo", "kontostand", "neuer saldo"], ColumnType::Balance, "de");
    insert(&mut map, &["betrag", "umsatz"], ColumnType::Amount, "de");

    // French
    insert(&mut map, &["date operation", "date opération", "date de valeur"], ColumnType::Date, "fr");
    insert(&mut map, &["libelle", "libellé", "designation", "désignation", "operation", "opération"], ColumnType::Description, "fr");
    insert(&mut map, &["débit", "retrait", "retraits"], ColumnType::Debit, "fr");
    insert(&mut map, &["crédit", "versement", "versements", "depot", "dépôt"], ColumnType::Credit, "fr");
    insert(&mut map, &["solde"], ColumnType::Balance, "fr");
    insert(&mut map, &["montant"], ColumnType::Amount, "fr");
    insert(&mut map, &["référence", "no piece", "n° pièce"], ColumnType::Reference, "fr");

    // Spanish
    insert(&mut map, &["fecha", "fecha operacion", "fecha operación", "fecha valor"], ColumnType::Date, "es");
    insert(&mut map, &["concepto", "descripcion", "descripción", "detalle", "movimiento"], ColumnType::Description, "es");
    insert(&mut map, &["cargo", "cargos", "debe", "retiro", "retiros", "debito", "débito"], ColumnType::Debit, "es");
    insert(&mut map, &["abono", "abonos", "haber", "deposito", "depósito", "ingreso", "ingresos", "credito", "crédito"], ColumnType::Credit, "es");
    insert(&mut map, &["saldo", "saldo disponible"], ColumnType::Balance, "es");
    insert(&mut map, &["importe", "monto"], ColumnType::Amount, "es");
    insert(&mut map, &["referencia"], ColumnType::Reference, "es");

    // Italian
    insert(&mut map, &["data", "data operazione", "data contabile", "data valuta"], ColumnType::Date, "it");
    insert(&mut map, &["descrizione", "causale", "dettagli"], ColumnType::Description, "it");
    insert(&mut map, &["addebito", "addebiti", "uscite", "dare"], ColumnType::Debit, "it");
    insert(&mut map, &["accredito", "accrediti", "entrate", "avere"], ColumnType::Credit, "it");
    insert(&mut map, &["saldo contabile"], ColumnType::Balance, "it");
    insert(&mut map, &["importo"], ColumnType::Amount, "it");

    // Portuguese
    insert(&mut map, &["data mov", "data movimento", "data lancamento", "data lançamento"], ColumnType::Date, "pt");
    insert(&mut map, &["historico", "histórico", "descricao", "descrição", "lancamento", "lançamento"], ColumnType::Description, "pt");
    insert(&mut map, &["debito", "débito", "saida", "saída", "saidas", "saídas"], ColumnType::Debit, "pt");
    insert(&mut map, &["credito", "crédito", "entrada", "entradas"], ColumnType::Credit, "pt");
    insert(&mut map, &["saldo atual"], ColumnType::Balance, "pt");
    insert(&mut map, &["valor"], ColumnType::Amount, "pt");
    insert(&mut map, &["documento"], ColumnType::Reference, "pt");

    // Dutch
    insert(&mut map, &["datum boeking", "boekdatum", "rentedatum", "transactiedatum"], ColumnType::Date, "nl");
    insert(&mut map, &["omschrijving", "naam", "mededelingen"], ColumnType::Description, "nl");
    insert(&mut map, &["af", "af bedrag", "afschrijving", "debet"], ColumnType::Debit, "nl");
    insert(&mut map, &["bij", "bij bedrag", "bijschrijving"], ColumnType::Credit, "nl");
    insert(&mut map, &["bedrag"], ColumnType::Amount, "nl");

    // Hindi (common romanizations on bilingual statements)
    insert(&mut map, &["dinank", "tithi"], ColumnType::Date, "hi");
    insert(&mut map, &["vivaran", "vivran"], ColumnType::Description, "hi");
    insert(&mut map, &["naame", "aahran"], ColumnType::Debit, "hi");
    insert(&mut map, &["jama"], ColumnType::Credit, "hi");
    insert(&mut map, &["shesh", "shesh rashi"], ColumnType::Balance, "hi");

    map
});

/// Normalize header text for dictionary lookup.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up a header cell; exact match on the normalized text.
pub fn lookup(text: &str) -> Option<HeaderEntry> {
    HEADER_DICTIONARY.get(normalize(text).as_str()).copied()
}

/// Look up a header cell, falling back to a contains-scan for composite
/// headers such as `debit (dr)` or `withdrawal amount (inr)`.
pub fn lookup_fuzzy(text: &str) -> Option<HeaderEntry> {
    if let Some(entry) = lookup(text) {
        return Some(entry);
    }
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }
    // Longest keyword contained in the header wins
    HEADER_DICTIONARY
        .iter()
        .filter(|(key, _)| {
            key.len() >= 3 && normalized.contains(*key)
        })
        .max_by_key(|(key, _)| key.len())
        .map(|(_, entry)| *entry)
}

/// Whether the header is a debit/credit synonym. These outrank every
/// content-based classification rule.
pub fn is_debit_credit_keyword(text: &str) -> Option<ColumnType> {
    lookup_fuzzy(text).and_then(|entry| match entry.column_type {
        ColumnType::Debit => Some(ColumnType::Debit),
        ColumnType::Credit => Some(ColumnType::Credit),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_lookup() {
        assert_eq!(lookup("Debit").unwrap().column_type, ColumnType::Debit);
        assert_eq!(lookup("  Running   Balance ").unwrap().column_type, ColumnType::Balance);
        assert_eq!(lookup("Particulars").unwrap().column_type, ColumnType::Description);
    }

    #[test]
    fn test_multilingual_lookup() {
        assert_eq!(lookup("Soll").unwrap().column_type, ColumnType::Debit);
        assert_eq!(lookup("Haben").unwrap().column_type, ColumnType::Credit);
        assert_eq!(lookup("Verwendungszweck").unwrap().column_type, ColumnType::Description);
        assert_eq!(lookup("Solde").unwrap().column_type, ColumnType::Balance);
        assert_eq!(lookup("Abono").unwrap().column_type, ColumnType::Credit);
    }

    #[test]
    fn test_fuzzy_composite_headers() {
        assert_eq!(
            lookup_fuzzy("Withdrawal Amount (INR)").unwrap().column_type,
            ColumnType::Debit
        );
        assert_eq!(
            lookup_fuzzy("Deposit Amt").unwrap().column_type,
            ColumnType::Credit
        );
        assert!(lookup_fuzzy("xyz").is_none());
    }

    #[test]
    fn test_debit_credit_keyword_gate() {
        assert_eq!(is_debit_credit_keyword("DR"), Some(ColumnType::Debit));
        assert_eq!(is_debit_credit_keyword("Paid In"), Some(ColumnType::Credit));
        assert_eq!(is_debit_credit_keyword("Balance"), None);
    }

    #[test]
    fn test_language_hints() {
        assert_eq!(lookup("Buchungstag").unwrap().language, "de");
        assert_eq!(lookup("Fecha").unwrap().language, "es");
    }
}
