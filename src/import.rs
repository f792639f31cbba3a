//! Workbook import orchestration
//!
//! Opens a submission, classifies each worksheet, runs the matching extractor
//! and either reports what it found (`preview`), hands the records to a
//! [`RecordSink`] (`commit`) or checks them for conformity (`verify`).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::config::Settings;
use crate::core::classifier::{classify_sheet, SheetMatch};
use crate::core::conformity::{ConformityReport, ConformityStatistics, VerificationMode};
use crate::error::{TegError, TegResult};
use crate::excel::extractor::{extract_sheet, ExtractionResult};
use crate::excel::reader::{read_workbook, Workbook};
use crate::sink::{RecordBatch, RecordSink};
use crate::types::ProductType;

/// Summary entry when no record was extracted at all
pub const NO_VALID_DATA: &str = "No valid data found in the workbook";

/// A worksheet that was classified and extracted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedSheet {
    pub name: String,
    pub product: ProductType,
    pub records: usize,
    pub errors: usize,
}

impl fmt::Display for ProcessedSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' → {}", self.name, self.product)
    }
}

/// Everything extracted from one workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookExtraction {
    pub result: ExtractionResult,
    pub sheets: Vec<ProcessedSheet>,
    /// Skipped worksheets (unrecognized or ambiguous names)
    pub warnings: Vec<String>,
}

impl WorkbookExtraction {
    pub fn summary(&self, max_reported_errors: usize) -> ImportSummary {
        let by_product = ProductType::ALL
            .iter()
            .map(|p| (*p, self.result.count(*p)))
            .collect();

        let total_lines = self.result.total();
        let mut errors = capped_errors(&self.result.errors, max_reported_errors);
        if total_lines == 0 {
            errors.push(NO_VALID_DATA.to_string());
        }

        ImportSummary {
            total_lines,
            by_product,
            processed_sheets: self.sheets.clone(),
            error_count: self.result.errors.len(),
            errors,
            warnings: self.warnings.clone(),
        }
    }
}

/// Keep the first `max` errors and note how many were left out
pub fn capped_errors(errors: &[String], max: usize) -> Vec<String> {
    let mut kept: Vec<String> = errors.iter().take(max).cloned().collect();
    if errors.len() > max {
        kept.push(format!("... and {} more errors", errors.len() - max));
    }
    kept
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub total_lines: usize,
    pub by_product: BTreeMap<ProductType, usize>,
    pub processed_sheets: Vec<ProcessedSheet>,
    /// Rejected rows and sheets; `errors` is capped and may add [`NO_VALID_DATA`]
    pub error_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Result of a dry run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPreview {
    pub summary: ImportSummary,
    pub statistics: ConformityStatistics,
}

/// What happened to one product's batch during a commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum BatchOutcome {
    Persisted(usize),
    Failed(String),
    /// No records of this product
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Success,
    /// Some batches persisted, some failed
    Partial,
    Failed,
    /// No record to store
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    pub run_id: Uuid,
    pub summary: ImportSummary,
    pub batches: BTreeMap<ProductType, BatchOutcome>,
    pub status: CommitStatus,
}

impl CommitReport {
    pub fn persisted(&self) -> usize {
        self.batches
            .values()
            .map(|b| match b {
                BatchOutcome::Persisted(n) => *n,
                _ => 0,
            })
            .sum()
    }

    /// Error for the first failed batch, or for an import that stored nothing
    pub fn ensure_persisted(&self) -> TegResult<()> {
        if self.status == CommitStatus::Empty {
            return Err(TegError::EmptyImport);
        }
        match self.batches.iter().find_map(|(product, outcome)| match outcome {
            BatchOutcome::Failed(message) => Some((*product, message.clone())),
            _ => None,
        }) {
            Some((product, message)) => Err(TegError::Sink { product, message }),
            None => Ok(()),
        }
    }
}

fn commit_status(batches: &BTreeMap<ProductType, BatchOutcome>) -> CommitStatus {
    let failed = batches
        .values()
        .filter(|b| matches!(b, BatchOutcome::Failed(_)))
        .count();
    let persisted = batches
        .values()
        .filter(|b| matches!(b, BatchOutcome::Persisted(_)))
        .count();

    match (failed, persisted) {
        (0, 0) => CommitStatus::Empty,
        (0, _) => CommitStatus::Success,
        (_, 0) => CommitStatus::Failed,
        _ => CommitStatus::Partial,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Importer {
    settings: Settings,
}

impl Importer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Classify and extract every worksheet of an opened workbook
    pub fn extract(&self, workbook: &Workbook, institution: &str) -> WorkbookExtraction {
        let mut extraction = WorkbookExtraction::default();

        for sheet in &workbook.sheets {
            let product = match classify_sheet(&sheet.name, &self.settings.aliases) {
                SheetMatch::Exact(p) | SheetMatch::Scored { product: p, .. } => p,
                SheetMatch::Ambiguous { candidates, .. } => {
                    let names: Vec<&str> = candidates.iter().map(|p| p.key()).collect();
                    let warning = format!(
                        "Sheet '{}' matches several products ({}), skipped",
                        sheet.name,
                        names.join(", ")
                    );
                    tracing::warn!("{}", warning);
                    extraction.warnings.push(warning);
                    continue;
                }
                SheetMatch::Unrecognized => {
                    let warning = format!("Sheet '{}' not recognized, skipped", sheet.name);
                    tracing::warn!("{}", warning);
                    extraction.warnings.push(warning);
                    continue;
                }
            };

            let result = extract_sheet(product, sheet, institution, self.settings.header_scan_rows);
            extraction.sheets.push(ProcessedSheet {
                name: sheet.name.clone(),
                product,
                records: result.total(),
                errors: result.errors.len(),
            });
            extraction.result.merge(result);
        }

        tracing::info!(
            institution,
            sheets = extraction.sheets.len(),
            records = extraction.result.total(),
            errors = extraction.result.errors.len(),
            "workbook extracted"
        );
        extraction
    }

    fn extract_file(&self, path: &Path, institution: &str) -> TegResult<WorkbookExtraction> {
        let workbook = read_workbook(path)?;
        Ok(self.extract(&workbook, institution))
    }

    /// Extract and check without persisting anything
    pub fn preview(&self, path: &Path, institution: &str) -> TegResult<ImportPreview> {
        let extraction = self.extract_file(path, institution)?;
        let report = self
            .settings
            .checker(VerificationMode::Batch)
            .check_all(extraction.result.iter());

        Ok(ImportPreview {
            summary: extraction.summary(self.settings.max_reported_errors),
            statistics: report.statistics,
        })
    }

    /// Extract and hand each product's records to `sink`, one batch per product
    pub fn commit(
        &self,
        path: &Path,
        institution: &str,
        sink: &mut dyn RecordSink,
    ) -> TegResult<CommitReport> {
        let extraction = self.extract_file(path, institution)?;
        Ok(self.commit_extraction(&extraction, institution, sink))
    }

    pub fn commit_extraction(
        &self,
        extraction: &WorkbookExtraction,
        institution: &str,
        sink: &mut dyn RecordSink,
    ) -> CommitReport {
        let run_id = Uuid::new_v4();
        let mut batches = BTreeMap::new();

        for product in ProductType::ALL {
            let records = extraction.result.of(product);
            if records.is_empty() {
                batches.insert(product, BatchOutcome::Skipped);
                continue;
            }

            let batch = RecordBatch {
                run_id,
                institution,
                product,
                records,
            };
            let outcome = match sink.persist_batch(&batch) {
                Ok(n) => BatchOutcome::Persisted(n),
                Err(e) => {
                    tracing::warn!(product = %product, error = %e, "batch not persisted");
                    BatchOutcome::Failed(e.to_string())
                }
            };
            batches.insert(product, outcome);
        }

        let status = commit_status(&batches);
        tracing::info!(%run_id, ?status, "commit finished");

        CommitReport {
            run_id,
            summary: extraction.summary(self.settings.max_reported_errors),
            batches,
            status,
        }
    }

    /// Extract and check every record in one pass
    pub fn verify(
        &self,
        path: &Path,
        institution: &str,
        mode: VerificationMode,
    ) -> TegResult<ConformityReport> {
        let extraction = self.extract_file(path, institution)?;
        Ok(self
            .settings
            .checker(mode)
            .check_all(extraction.result.iter()))
    }
}
