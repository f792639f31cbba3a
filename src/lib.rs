//! TEG Verify - effective global rate conformity for institution submissions
//!
//! This library reads the spreadsheets financial institutions submit, extracts
//! one typed record per credit line, recomputes the effective global rate
//! (TEG) of each record and checks it against the rate the institution declared.
//!
//! # Features
//!
//! - Worksheet classification by loose, free-text sheet names
//! - Six product templates (amortizing credit, overdraft, factoring,
//!   guarantee, commercial paper, spot credit)
//! - Tolerant cell normalization (locale amounts, text or native dates)
//! - Per-product and global conformity statistics
//! - Preview, commit (through a [`sink::RecordSink`]) and verify modes
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use teg_verify::config::Settings;
//! use teg_verify::import::Importer;
//! use teg_verify::core::VerificationMode;
//!
//! let importer = Importer::new(Settings::default());
//! let report = importer.verify(Path::new("submission.xlsx"), "BANK", VerificationMode::Batch)?;
//!
//! println!("Conformity: {}%", report.statistics.global.conformity_rate);
//! for check in report.non_conformant() {
//!     println!("{} row {}", check.origin.sheet, check.origin.row);
//! }
//! # Ok::<(), teg_verify::error::TegError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod import;
pub mod normalize;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use error::{TegError, TegResult};
pub use import::Importer;
pub use types::{CellValue, ProductRecord, ProductType, RateOutcome};
