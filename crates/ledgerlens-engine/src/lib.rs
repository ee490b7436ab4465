//! # ledgerlens-engine
//!
//! Pipeline orchestration for the statement parsing engine.
//!
//! The [`Engine`] runs the full pipeline over positioned text fragments:
//! line grouping, header extraction, table and column detection, locale
//! detection, row extraction, stitching, segmentation, value parsing,
//! chronology normalization, and balance validation with safe repair.
//! Every stage is fail-open: degradations become warnings, and only broken
//! structural invariants fail a document.
//!
//! ```
//! use ledgerlens_config::ProcessingConfig;
//! use ledgerlens_engine::Engine;
//!
//! let engine = Engine::new(ProcessingConfig::default()).unwrap();
//! let result = engine.process_document("empty.pdf", &[]);
//! assert!(result.success);
//! assert!(!result.warnings.is_empty());
//! ```

pub mod observer;
pub mod pipeline;

pub use observer::{NullObserver, PipelineEvent, PipelineObserver, TracingObserver};
pub use pipeline::Engine;

// The secondary operations share the engine's data model
pub use ledgerlens_validate::{
    pre_export_check, quick_validate, validate_export, ExportValidationReport, ExportVerdict,
    ExportedRow,
};
