//! # ledgerlens-parse
//!
//! Content interpretation for statement tables:
//!
//! - Locale and number-format detection from headers and sample values
//! - Statement-header extraction (account metadata, masked at source)
//! - Row extraction: mapping line fragments to column cells
//! - Multi-line stitching of continuation rows
//! - Value parsing: locale-aware numbers, dates, categories, currencies

pub mod builder;
pub mod category;
pub mod currency;
pub mod dates;
pub mod header_extract;
pub mod locale;
pub mod numbers;
pub mod row_extractor;
pub mod stitcher;

pub use builder::build_transactions;
pub use header_extract::extract_statement_header;
pub use locale::{detect_locale, LocaleProfile, NumberFormat};
pub use row_extractor::extract_rows;
pub use stitcher::stitch_rows;
