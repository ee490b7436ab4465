//! Processing results and per-stage observability reports.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{ColumnBoundary, ParsedDocument};
use crate::provenance::ProvenanceLedger;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Cluster fragments into logical lines
    LineGrouping,
    /// Extract account metadata from the top of page 1
    HeaderExtraction,
    /// Find contiguous tabular line spans
    RegionDetection,
    /// Locate column separators from gutter histograms
    ColumnDetection,
    /// Assign semantic roles to columns
    ColumnClassification,
    /// Infer number format and locale
    LocaleDetection,
    /// Map line tokens to column cells
    RowExtraction,
    /// Merge continuation lines into transactions
    Stitching,
    /// Parse dates, numbers, categories, currencies
    ValueParsing,
    /// Split on repeated opening-balance markers
    Segmentation,
    /// Detect and normalize date ordering
    Chronology,
    /// Row-by-row balance arithmetic and safe repair
    BalanceValidation,
}

/// Lifecycle state of a pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not yet started
    #[default]
    Pending,
    /// Currently running
    Processing,
    /// Finished, possibly with warnings
    Complete,
    /// Aborted with a fatal error
    Error,
}

/// Observability record for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage
    pub stage: StageKind,
    /// Final lifecycle state
    pub status: StageStatus,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Degradations encountered
    pub warnings: Vec<String>,
    /// Fatal diagnostic, when `status == Error`
    pub error: Option<String>,
}

impl StageReport {
    /// A completed stage with no findings.
    pub fn complete(stage: StageKind, duration_ms: u64) -> Self {
        Self {
            stage,
            status: StageStatus::Complete,
            duration_ms,
            warnings: Vec::new(),
            error: None,
        }
    }
}

/// A stage's best-effort output together with the degradations it met.
///
/// Stages never abort on shape or parse problems; they return what they
/// could produce plus a warning per degradation (fail-open policy).
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome<T> {
    /// Best-effort output
    pub output: T,
    /// Degradations encountered, in order
    pub warnings: Vec<String>,
}

impl<T> StageOutcome<T> {
    /// A clean outcome with no warnings.
    pub fn clean(output: T) -> Self {
        Self {
            output,
            warnings: Vec::new(),
        }
    }

    /// An outcome carrying warnings.
    pub fn with_warnings(output: T, warnings: Vec<String>) -> Self {
        Self { output, warnings }
    }
}

/// Per-table extraction metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetrics {
    /// Pages the table spans
    pub page_numbers: Vec<u32>,
    /// Data lines in the table
    pub line_count: usize,
    /// Detected columns
    pub column_count: usize,
    /// Region detection confidence
    pub confidence: f64,
}

/// Result of `process_document`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// False only for fatal structural errors
    pub success: bool,
    /// Parsed document, possibly partial
    pub document: Option<ParsedDocument>,
    /// Fatal and non-fatal errors encountered
    pub errors: Vec<EngineError>,
    /// Every degradation applied (reversal, repair, inferred columns, ...)
    pub warnings: Vec<String>,
    /// One report per executed pipeline stage
    pub stages: Vec<StageReport>,
    /// Total wall-clock duration
    pub total_duration_ms: u64,
    /// Metrics per detected table
    pub per_table_metrics: Option<Vec<TableMetrics>>,
    /// Final column layout (first table), for callers that render overlays
    pub column_boundaries: Option<Vec<ColumnBoundary>>,
    /// Document-level confidence, 0..=1
    pub confidence: Option<f64>,
    /// Cell-level audit trail
    pub provenance: Option<ProvenanceLedger>,
    /// Schema-gate violations over emitted rows (always reported)
    pub schema_violations: Vec<String>,
}

impl ProcessingResult {
    /// A failed result carrying a fatal error.
    pub fn fatal(error: EngineError, stages: Vec<StageReport>, total_duration_ms: u64) -> Self {
        Self {
            success: false,
            document: None,
            errors: vec![error],
            warnings: Vec::new(),
            stages,
            total_duration_ms,
            per_table_metrics: None,
            column_boundaries: None,
            confidence: None,
            provenance: None,
            schema_violations: Vec::new(),
        }
    }
}
