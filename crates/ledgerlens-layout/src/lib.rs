//! # ledgerlens-layout
//!
//! Table geometry inference from positioned text fragments:
//!
//! - Line grouping: cluster fragments into logical lines by Y-proximity
//! - Region detection: find contiguous spans of table-shaped lines
//! - Column boundary detection: density-adaptive vertical-gutter histograms
//! - Column classification: semantic roles from headers and content
//!
//! Every stage is a pure function over its input returning a
//! [`StageOutcome`](ledgerlens_core::StageOutcome) with best-effort output
//! and warnings.

pub mod classifier;
pub mod column_detector;
pub mod line_grouper;
pub mod region_detector;

pub use classifier::classify_columns;
pub use column_detector::detect_column_boundaries;
pub use line_grouper::group_into_lines;
pub use region_detector::detect_table_regions;
