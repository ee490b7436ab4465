//! # ledgerlens-validate
//!
//! Arithmetic integrity for parsed statements:
//!
//! - Segmentation on repeated opening-balance markers (merged PDFs)
//! - Chronology normalization (descending documents reversed, balances
//!   recomputed from the opening balance)
//! - Row-by-row balance validation with tiered tolerances
//! - Safe repair: bounded debit/credit classification flips that never
//!   change a magnitude
//! - Export round-trip validation

pub mod balance;
pub mod chronology;
pub mod export;
pub mod repair;
pub mod segmenter;

pub use balance::{quick_validate, validate_segment, SegmentValidation};
pub use chronology::{detect_date_order, normalize_chronology};
pub use export::{pre_export_check, validate_export, ExportValidationReport, ExportVerdict, ExportedRow};
pub use repair::{attempt_repair, RepairReport};
pub use segmenter::{split_into_segments, RowSegment};
