//! Compile-time pattern catalogs.
//!
//! All regex tables used across the pipeline live here, precompiled and
//! indexed by canonical key: date shapes, multilingual column headers,
//! spending categories, currency symbols with a static USD-pivot rate
//! table, and a global bank-name list.

pub mod banks;
pub mod categories;
pub mod currency;
pub mod dates;
pub mod headers;
