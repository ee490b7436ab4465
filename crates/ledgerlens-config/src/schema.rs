//! Configuration schema for document processing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Locale handling: infer from content or force a specific code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocaleDetection {
    /// Infer locale from header language and numeric shapes
    #[default]
    Auto,
    /// Use an explicit locale code, e.g. `de-DE`
    Explicit(String),
}

/// Column boundary detection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDetectionMode {
    /// Lock header-keyword bounding boxes and project them onto later pages
    Anchor,
    /// Detect once on the first region and reuse for all regions
    Fixed,
    /// Gutter-histogram detection per region
    #[default]
    Auto,
}

/// Balance-arithmetic tolerance tiers.
///
/// A row difference at or below `rounding` is `Valid`, at or below `cent`
/// is `Warning`, above is `Error`. `epsilon` bounds the segment-level
/// closing-balance check and repair acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Exact-match tier (zero for strict equality)
    #[serde(default = "default_exact")]
    pub exact: Decimal,
    /// Rounding tier; at or below stays `Valid`
    #[serde(default = "default_rounding")]
    pub rounding: Decimal,
    /// Cent tier; at or below degrades to `Warning`
    #[serde(default = "default_cent")]
    pub cent: Decimal,
    /// Segment-level tolerance for closing-balance checks and repair
    #[serde(default = "default_epsilon")]
    pub epsilon: Decimal,
}

fn default_exact() -> Decimal {
    Decimal::ZERO
}
fn default_rounding() -> Decimal {
    dec!(0.01)
}
fn default_cent() -> Decimal {
    dec!(0.05)
}
fn default_epsilon() -> Decimal {
    dec!(0.01)
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            exact: default_exact(),
            rounding: default_rounding(),
            cent: default_cent(),
            epsilon: default_epsilon(),
        }
    }
}

/// Safe-repair bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Whether repair may run at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on candidate pairs for the two-row flip search
    #[serde(default = "default_max_pair_candidates")]
    pub max_pair_candidates: usize,
    /// Minimum fraction of rows that must carry an amount
    #[serde(default = "default_min_amount_coverage")]
    pub min_amount_coverage: f64,
}

fn default_max_pair_candidates() -> usize {
    50
}
fn default_min_amount_coverage() -> f64 {
    0.8
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_pair_candidates: default_max_pair_candidates(),
            min_amount_coverage: default_min_amount_coverage(),
        }
    }
}

/// Root configuration for `process_document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Fail the document if any row errors
    #[serde(default = "default_true")]
    pub strict_validation: bool,
    /// Merge continuation lines into their transactions
    #[serde(default = "default_true")]
    pub auto_stitch_multi_line: bool,
    /// Split on repeated opening-balance markers
    #[serde(default = "default_true")]
    pub detect_merged_pdfs: bool,
    /// Locale handling
    #[serde(default)]
    pub locale_detection: LocaleDetection,
    /// Column boundary strategy
    #[serde(default)]
    pub column_detection: ColumnDetectionMode,
    /// Reverse newest-first documents into chronological order
    #[serde(default = "default_true")]
    pub auto_reverse_chronological: bool,
    /// Check date ordering within segments
    #[serde(default = "default_true")]
    pub validate_date_sequence: bool,
    /// Score descriptions against the category library
    #[serde(default = "default_true")]
    pub enable_categorization: bool,
    /// Detect and convert foreign-currency rows
    #[serde(default = "default_true")]
    pub enable_currency_detection: bool,
    /// Local currency (ISO 4217)
    #[serde(default = "default_currency")]
    pub local_currency: String,
    /// Fraction of a fragment's width that must overlap a column to be
    /// assigned to it
    #[serde(default = "default_column_overlap_threshold")]
    pub column_overlap_threshold: f64,
    /// Vertical gap (units) above which consecutive lines are unrelated
    #[serde(default = "default_row_gap_threshold")]
    pub row_gap_threshold: f64,
    /// Minimum acceptable extraction confidence, 0..=1
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Y-tolerance (units) when clustering fragments into lines
    #[serde(default = "default_line_y_tolerance")]
    pub line_y_tolerance: f64,
    /// Maximum continuation lines merged into one transaction
    #[serde(default = "default_max_continuation_lines")]
    pub max_continuation_lines: usize,
    /// Balance tolerance tiers
    #[serde(default)]
    pub tolerances: ToleranceConfig,
    /// Safe-repair bounds
    #[serde(default)]
    pub repair: RepairConfig,
}

fn default_true() -> bool {
    true
}
fn default_currency() -> String {
    "USD".to_string()
}
fn default_column_overlap_threshold() -> f64 {
    0.3
}
fn default_row_gap_threshold() -> f64 {
    20.0
}
fn default_confidence_threshold() -> f64 {
    0.7
}
fn default_line_y_tolerance() -> f64 {
    3.0
}
fn default_max_continuation_lines() -> usize {
    5
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
            auto_stitch_multi_line: true,
            detect_merged_pdfs: true,
            locale_detection: LocaleDetection::default(),
            column_detection: ColumnDetectionMode::default(),
            auto_reverse_chronological: true,
            validate_date_sequence: true,
            enable_categorization: true,
            enable_currency_detection: true,
            local_currency: default_currency(),
            column_overlap_threshold: default_column_overlap_threshold(),
            row_gap_threshold: default_row_gap_threshold(),
            confidence_threshold: default_confidence_threshold(),
            line_y_tolerance: default_line_y_tolerance(),
            max_continuation_lines: default_max_continuation_lines(),
            tolerances: ToleranceConfig::default(),
            repair: RepairConfig::default(),
        }
    }
}
