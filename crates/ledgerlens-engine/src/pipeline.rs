//! The processing pipeline: ten stages from fragments to a validated
//! document.

use std::time::Instant;

use chrono::Datelike;
use rust_decimal::Decimal;
use tracing::debug;

use ledgerlens_config::{
    validate_config, ColumnDetectionMode, LocaleDetection, ProcessingConfig,
};
use ledgerlens_core::catalog::headers;
use ledgerlens_core::{
    ColumnBoundary, ColumnType, DateOrder, DocumentSegment, DocumentTotals, EngineResult,
    ExtractedStatementHeader, Line, ParsedDocument, ProcessingResult, ProvenanceLedger,
    RowIdFactory, StageKind, StageOutcome, StageReport, StageStatus, StatementPeriod, TableMetrics,
    TableRegion, TextFragment, Transaction, ValidationStatus,
};
use ledgerlens_parse::locale::LocaleProfile;
use ledgerlens_parse::{
    build_transactions, detect_locale, extract_rows, extract_statement_header, stitch_rows,
};
use ledgerlens_validate::{
    attempt_repair, normalize_chronology, split_into_segments, validate_segment,
};

use crate::observer::{NullObserver, PipelineEvent, PipelineObserver};

/// The statement parsing engine.
///
/// One engine value serves any number of documents; each call to
/// [`Engine::process_document`] is an independent, deterministic run with
/// no shared mutable state.
#[derive(Debug, Clone)]
pub struct Engine {
    config: ProcessingConfig,
}

impl Engine {
    /// Create an engine, validating the configuration up front.
    pub fn new(config: ProcessingConfig) -> EngineResult<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    /// An engine with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: ProcessingConfig::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process one document without observation.
    pub fn process_document(&self, file_name: &str, fragments: &[TextFragment]) -> ProcessingResult {
        self.process_document_observed(file_name, fragments, &NullObserver)
    }

    /// Process one document, emitting events to the observer.
    pub fn process_document_observed(
        &self,
        file_name: &str,
        fragments: &[TextFragment],
        observer: &dyn PipelineObserver,
    ) -> ProcessingResult {
        let started = Instant::now();
        let mut log = StageLog::new(observer);

        // Structural gate: malformed geometry is fatal for the document
        for fragment in fragments {
            if let Err(error) = fragment.validate() {
                observer.on_event(&PipelineEvent::DocumentCompleted {
                    success: false,
                    transactions: 0,
                });
                return ProcessingResult::fatal(
                    error,
                    log.reports,
                    started.elapsed().as_millis() as u64,
                );
            }
        }

        if fragments.is_empty() {
            let mut result = self.empty_result(file_name, started);
            result.warnings.push("no text fragments supplied".to_string());
            observer.on_event(&PipelineEvent::DocumentCompleted {
                success: true,
                transactions: 0,
            });
            return result;
        }

        let total_pages = fragments.iter().map(|f| f.page_number).max().unwrap_or(0);

        // C1: line grouping
        let lines = log.run(StageKind::LineGrouping, || {
            ledgerlens_layout::group_into_lines(fragments, self.config.line_y_tolerance)
        });

        // Statement header, before table detection
        let initial_profile = self.initial_profile();
        let header = log.run(StageKind::HeaderExtraction, || {
            extract_statement_header(&lines, &initial_profile)
        });

        // C2: table regions
        let regions = log.run(StageKind::RegionDetection, || {
            ledgerlens_layout::detect_table_regions(&lines, self.config.row_gap_threshold)
        });
        if regions.is_empty() {
            let mut result = self.empty_result(file_name, started);
            result.document = Some(self.bare_document(file_name, total_pages, header));
            result.stages = log.reports;
            result.warnings = log.warnings;
            result.warnings.push("no table regions detected".to_string());
            observer.on_event(&PipelineEvent::DocumentCompleted {
                success: true,
                transactions: 0,
            });
            return result;
        }

        // C3 + C4: column boundaries and classification per region
        let boundaries_per_region = self.resolve_boundaries(&regions, &mut log);

        // C5: locale, from header language and sampled numeric cells
        let profile = match &self.config.locale_detection {
            LocaleDetection::Explicit(code) => {
                let explicit = LocaleProfile::from_code(code);
                log.run(StageKind::LocaleDetection, || {
                    StageOutcome::clean(explicit.clone())
                })
            }
            LocaleDetection::Auto => {
                let header_texts = sample_header_texts(&regions);
                let numeric_samples = sample_numeric_texts(&regions, &boundaries_per_region);
                log.run(StageKind::LocaleDetection, || {
                    detect_locale(&header_texts, &numeric_samples)
                })
            }
        };

        // C6: raw rows
        let rows = log.run(StageKind::RowExtraction, || {
            let mut all_rows = Vec::new();
            let mut warnings = Vec::new();
            for (region, boundaries) in regions.iter().zip(&boundaries_per_region) {
                let outcome = extract_rows(region, boundaries, self.config.column_overlap_threshold);
                all_rows.extend(outcome.output);
                warnings.extend(outcome.warnings);
            }
            StageOutcome::with_warnings(all_rows, warnings)
        });

        // C7: stitching
        let rows = if self.config.auto_stitch_multi_line {
            log.run(StageKind::Stitching, || {
                stitch_rows(rows, &profile, self.config.max_continuation_lines)
            })
        } else {
            rows
        };

        // Segment boundaries from opening-balance markers
        let row_segments = log.run(StageKind::Segmentation, || {
            split_into_segments(rows, &lines, &profile, self.config.detect_merged_pdfs)
        });

        // C8: value parsing, one id/provenance stream per document
        let mut ids = RowIdFactory::new(file_name);
        let mut ledger = ProvenanceLedger::new();
        let reference_year = header
            .statement_period_from
            .or(header.statement_period_to)
            .map(|d| d.year());

        let mut segments: Vec<DocumentSegment> = Vec::new();
        let mut raw_transactions: Vec<Transaction> = Vec::new();
        for (index, row_segment) in row_segments.iter().enumerate() {
            let transactions = log.run(StageKind::ValueParsing, || {
                build_transactions(
                    &row_segment.rows,
                    &profile,
                    &self.config,
                    reference_year,
                    &mut ids,
                    &mut ledger,
                )
            });
            raw_transactions.extend(transactions.iter().cloned());

            let mut segment = DocumentSegment::new(index, row_segment.start_page);
            segment.end_page = row_segment.end_page;
            segment.opening_balance = row_segment.opening_balance;
            segment.closing_balance = row_segment.closing_balance;
            segment.account_number = header.account_number_masked.clone();
            segment.statement_period = match (header.statement_period_from, header.statement_period_to)
            {
                (Some(from), Some(to)) => Some(StatementPeriod { from, to }),
                _ => None,
            };
            segment.transactions = transactions;
            segments.push(segment);
        }

        // C9: chronology per segment
        let mut document_order = DateOrder::Unknown;
        let mut was_reversed = false;
        if self.config.validate_date_sequence {
            for segment in &mut segments {
                let transactions = std::mem::take(&mut segment.transactions);
                let opening = segment.opening_balance;
                let (normalized, order, reversed) = log.run(StageKind::Chronology, || {
                    normalize_chronology(
                        transactions,
                        opening,
                        self.config.auto_reverse_chronological,
                        &mut ledger,
                    )
                });
                segment.transactions = normalized;
                was_reversed |= reversed;
                document_order = combine_orders(document_order, order);
            }
        }

        // C10: balance validation and safe repair per segment
        let mut overall = if segments.is_empty() {
            ValidationStatus::Unchecked
        } else {
            ValidationStatus::Valid
        };
        for segment in &mut segments {
            let status = log.run(StageKind::BalanceValidation, || {
                self.validate_and_repair(segment, &mut ledger)
            });
            overall = overall.worst(status);
        }

        // Schema gate over everything emitted
        let schema_violations: Vec<String> = segments
            .iter()
            .flat_map(|s| s.transactions.iter())
            .flat_map(Transaction::schema_violations)
            .collect();

        let all_transactions: Vec<&Transaction> =
            segments.iter().flat_map(|s| s.transactions.iter()).collect();
        let totals = DocumentTotals::tally(all_transactions.iter().copied());
        let transaction_count = totals.total;

        if !self.config.strict_validation && overall == ValidationStatus::Error {
            overall = ValidationStatus::Warning;
            log.warnings
                .push("row errors downgraded to warnings (strict validation off)".to_string());
        }
        if overall == ValidationStatus::Error {
            log.warnings
                .push("document has validation errors; review before export".to_string());
        }

        let confidence = document_confidence(&all_transactions);
        if let Some(confidence) = confidence {
            if confidence < self.config.confidence_threshold {
                log.warnings.push(format!(
                    "document confidence {confidence:.2} below threshold {}",
                    self.config.confidence_threshold
                ));
            }
        }

        let per_table_metrics: Vec<TableMetrics> = regions
            .iter()
            .zip(&boundaries_per_region)
            .map(|(region, boundaries)| TableMetrics {
                page_numbers: region.page_numbers.clone(),
                line_count: region.data_lines.len(),
                column_count: boundaries.len(),
                confidence: region.confidence,
            })
            .collect();

        let document = ParsedDocument {
            file_name: file_name.to_string(),
            total_pages,
            detected_locale: profile.locale.clone(),
            segments,
            totals,
            overall_validation: overall,
            date_order: document_order,
            was_reversed,
            extracted_header: header,
            raw_transactions,
        };

        observer.on_event(&PipelineEvent::DocumentCompleted {
            success: true,
            transactions: transaction_count,
        });
        debug!(
            file_name,
            transactions = transaction_count,
            ?overall,
            "document processed"
        );

        ProcessingResult {
            success: true,
            document: Some(document),
            errors: Vec::new(),
            warnings: log.warnings,
            stages: log.reports,
            total_duration_ms: started.elapsed().as_millis() as u64,
            per_table_metrics: Some(per_table_metrics),
            column_boundaries: boundaries_per_region.into_iter().next(),
            confidence,
            provenance: Some(ledger),
            schema_violations,
        }
    }

    /// Validate one segment, attempting safe repair when arithmetic fails.
    fn validate_and_repair(
        &self,
        segment: &mut DocumentSegment,
        ledger: &mut ProvenanceLedger,
    ) -> StageOutcome<ValidationStatus> {
        let mut warnings = Vec::new();
        let tolerances = &self.config.tolerances;
        let validation = validate_segment(
            &mut segment.transactions,
            segment.opening_balance,
            segment.closing_balance,
            tolerances,
        );
        let mut status = validation.status;
        warnings.extend(validation.messages.iter().cloned());

        if status != ValidationStatus::Valid {
            // Closing for repair: the declared marker, else the last
            // extracted balance
            let closing = segment
                .closing_balance
                .or_else(|| last_extracted_balance(&segment.transactions));
            if let Some((repaired, report)) = attempt_repair(
                &segment.transactions,
                segment.opening_balance,
                closing,
                &self.config.repair,
                tolerances.epsilon,
                ledger,
            ) {
                segment.transactions = repaired;
                let revalidation = validate_segment(
                    &mut segment.transactions,
                    segment.opening_balance,
                    segment.closing_balance,
                    tolerances,
                );
                status = revalidation.status;
                warnings.push(report.summary());
            }
        }

        if segment.closing_balance.is_none() {
            segment.closing_balance = last_extracted_balance(&segment.transactions);
        }
        StageOutcome::with_warnings(status, warnings)
    }

    /// Boundary detection per region, honoring the configured mode.
    fn resolve_boundaries(
        &self,
        regions: &[TableRegion],
        log: &mut StageLog<'_>,
    ) -> Vec<Vec<ColumnBoundary>> {
        let mut per_region: Vec<Vec<ColumnBoundary>> = Vec::with_capacity(regions.len());

        match self.config.column_detection {
            ColumnDetectionMode::Anchor => {
                let anchored = log.run(StageKind::ColumnDetection, || anchor_boundaries(regions));
                log.run(StageKind::ColumnClassification, || {
                    StageOutcome::clean(())
                });
                for _ in regions {
                    per_region.push(anchored.clone());
                }
            }
            ColumnDetectionMode::Fixed => {
                let detected = log.run(StageKind::ColumnDetection, || {
                    ledgerlens_layout::detect_column_boundaries(&regions[0])
                });
                let classified = log.run(StageKind::ColumnClassification, || {
                    ledgerlens_layout::classify_columns(&regions[0], &detected)
                });
                for _ in regions {
                    per_region.push(classified.clone());
                }
            }
            ColumnDetectionMode::Auto => {
                let detected_all = log.run(StageKind::ColumnDetection, || {
                    let mut outputs = Vec::new();
                    let mut warnings = Vec::new();
                    for region in regions {
                        let outcome = ledgerlens_layout::detect_column_boundaries(region);
                        outputs.push(outcome.output);
                        warnings.extend(outcome.warnings);
                    }
                    StageOutcome::with_warnings(outputs, warnings)
                });
                let classified_all = log.run(StageKind::ColumnClassification, || {
                    let mut outputs: Vec<Vec<ColumnBoundary>> = Vec::new();
                    let mut warnings = Vec::new();
                    for (region, detected) in regions.iter().zip(&detected_all) {
                        // A region whose layout matches the previous one is
                        // the same table continued; reuse its classification
                        if let Some(previous) = outputs.last() {
                            if layout_matches(previous, detected) {
                                warnings.push(format!(
                                    "table continued on page(s) {:?}; reusing column roles",
                                    region.page_numbers
                                ));
                                outputs.push(previous.clone());
                                continue;
                            }
                        }
                        let outcome = ledgerlens_layout::classify_columns(region, detected);
                        warnings.extend(outcome.warnings);
                        outputs.push(outcome.output);
                    }
                    StageOutcome::with_warnings(outputs, warnings)
                });
                per_region = classified_all;
            }
        }
        per_region
    }

    fn initial_profile(&self) -> LocaleProfile {
        match &self.config.locale_detection {
            LocaleDetection::Explicit(code) => LocaleProfile::from_code(code),
            LocaleDetection::Auto => LocaleProfile::us_english(),
        }
    }

    fn empty_result(&self, file_name: &str, started: Instant) -> ProcessingResult {
        ProcessingResult {
            success: true,
            document: Some(ParsedDocument::empty(file_name)),
            errors: Vec::new(),
            warnings: Vec::new(),
            stages: Vec::new(),
            total_duration_ms: started.elapsed().as_millis() as u64,
            per_table_metrics: None,
            column_boundaries: None,
            confidence: None,
            provenance: None,
            schema_violations: Vec::new(),
        }
    }

    fn bare_document(
        &self,
        file_name: &str,
        total_pages: u32,
        header: ExtractedStatementHeader,
    ) -> ParsedDocument {
        let mut document = ParsedDocument::empty(file_name);
        document.total_pages = total_pages;
        document.extracted_header = header;
        document
    }
}

/// Stage bookkeeping: reports, aggregated warnings, observer events.
struct StageLog<'a> {
    reports: Vec<StageReport>,
    warnings: Vec<String>,
    observer: &'a dyn PipelineObserver,
}

impl<'a> StageLog<'a> {
    fn new(observer: &'a dyn PipelineObserver) -> Self {
        Self {
            reports: Vec::new(),
            warnings: Vec::new(),
            observer,
        }
    }

    fn run<T>(&mut self, stage: StageKind, f: impl FnOnce() -> StageOutcome<T>) -> T {
        self.observer.on_event(&PipelineEvent::StageStarted { stage });
        let start = Instant::now();
        let outcome = f();
        let duration_ms = start.elapsed().as_millis() as u64;
        for message in &outcome.warnings {
            self.observer.on_event(&PipelineEvent::Warning {
                stage,
                message: message.clone(),
            });
        }
        self.observer.on_event(&PipelineEvent::StageCompleted {
            stage,
            duration_ms,
            warnings: outcome.warnings.len(),
        });
        self.warnings.extend(outcome.warnings.iter().cloned());
        self.reports.push(StageReport {
            stage,
            status: StageStatus::Complete,
            duration_ms,
            warnings: outcome.warnings,
            error: None,
        });
        outcome.output
    }
}

/// Anchor mode: lock header-keyword bounding boxes as column strips.
fn anchor_boundaries(regions: &[TableRegion]) -> StageOutcome<Vec<ColumnBoundary>> {
    const ANCHOR_PADDING: f64 = 8.0;
    let mut warnings = Vec::new();

    for region in regions {
        for line in region.data_lines.iter().take(3) {
            let mut anchored: Vec<ColumnBoundary> = Vec::new();
            for fragment in &line.fragments {
                if let Some(entry) = headers::lookup_fuzzy(&fragment.text) {
                    let bbox = &fragment.bounding_box;
                    if let Ok(boundary) =
                        ColumnBoundary::new(bbox.x - ANCHOR_PADDING, bbox.right() + ANCHOR_PADDING)
                    {
                        anchored.push(boundary.with_type(entry.column_type, 0.95));
                    }
                }
            }
            if anchored.len() >= 3 {
                anchored.sort_by(|a, b| {
                    a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal)
                });
                return StageOutcome::clean(anchored);
            }
        }
    }

    warnings.push("no header keywords to anchor on; falling back to gutter detection".to_string());
    let fallback = ledgerlens_layout::detect_column_boundaries(&regions[0]);
    let classified = ledgerlens_layout::classify_columns(&regions[0], &fallback.output);
    warnings.extend(fallback.warnings);
    warnings.extend(classified.warnings);
    StageOutcome::with_warnings(classified.output, warnings)
}

/// Whether two boundary layouts describe the same table.
fn layout_matches(a: &[ColumnBoundary], b: &[ColumnBoundary]) -> bool {
    const CENTER_TOLERANCE: f64 = 15.0;
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x.center_x() - y.center_x()).abs() <= CENTER_TOLERANCE)
}

fn combine_orders(current: DateOrder, next: DateOrder) -> DateOrder {
    match (current, next) {
        (DateOrder::Unknown, order) => order,
        (order, DateOrder::Unknown) => order,
        (a, b) if a == b => a,
        _ => DateOrder::Mixed,
    }
}

fn last_extracted_balance(transactions: &[Transaction]) -> Option<Decimal> {
    transactions.iter().rev().find_map(|t| t.balance)
}

fn document_confidence(transactions: &[&Transaction]) -> Option<f64> {
    if transactions.is_empty() {
        return None;
    }
    let sum: f64 = transactions.iter().map(|t| t.confidence.overall).sum();
    Some(sum / transactions.len() as f64 / 100.0)
}

/// Header texts sampled from the first line of each region.
fn sample_header_texts(regions: &[TableRegion]) -> Vec<String> {
    regions
        .iter()
        .filter_map(|r| r.data_lines.first())
        .flat_map(|line: &Line| line.fragments.iter().map(|f| f.text.clone()))
        .collect()
}

/// Numeric cell texts sampled from monetary and unclassified columns.
fn sample_numeric_texts(
    regions: &[TableRegion],
    boundaries_per_region: &[Vec<ColumnBoundary>],
) -> Vec<String> {
    const SAMPLE_LINES: usize = 40;
    let mut samples = Vec::new();
    for (region, boundaries) in regions.iter().zip(boundaries_per_region) {
        for line in region.data_lines.iter().skip(1).take(SAMPLE_LINES) {
            for fragment in &line.fragments {
                let in_monetary = boundaries.iter().any(|b| {
                    (b.inferred_type.is_monetary() || b.inferred_type == ColumnType::Unknown)
                        && b.contains_fragment(&fragment.bounding_box, 0.5)
                });
                if in_monetary {
                    samples.push(fragment.text.clone());
                }
            }
        }
    }
    samples
}
