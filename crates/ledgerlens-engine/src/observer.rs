//! Structured pipeline observation.
//!
//! The engine emits events instead of logging directly; the caller decides
//! what to do with them. [`TracingObserver`] bridges events onto the
//! `tracing` subscriber for callers that just want logs.

use ledgerlens_core::StageKind;
use tracing::{debug, warn};

/// One observable pipeline event.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A stage began.
    StageStarted {
        /// Which stage
        stage: StageKind,
    },
    /// A stage finished.
    StageCompleted {
        /// Which stage
        stage: StageKind,
        /// Wall-clock duration
        duration_ms: u64,
        /// Number of warnings the stage produced
        warnings: usize,
    },
    /// A degradation was recorded.
    Warning {
        /// Stage that produced it
        stage: StageKind,
        /// Human-readable description
        message: String,
    },
    /// The document finished processing.
    DocumentCompleted {
        /// Whether processing succeeded
        success: bool,
        /// Emitted transaction count
        transactions: usize,
    },
}

/// Receiver for pipeline events.
///
/// Implementations must be cheap; events fire synchronously from inside
/// the pipeline.
pub trait PipelineObserver {
    /// Handle one event.
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Observer that forwards events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => debug!(?stage, "stage started"),
            PipelineEvent::StageCompleted {
                stage,
                duration_ms,
                warnings,
            } => debug!(?stage, duration_ms, warnings, "stage completed"),
            PipelineEvent::Warning { stage, message } => warn!(?stage, %message, "degradation"),
            PipelineEvent::DocumentCompleted {
                success,
                transactions,
            } => debug!(success, transactions, "document completed"),
        }
    }
}
