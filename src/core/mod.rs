//! Classification, rate calculation and conformity checking

pub mod classifier;
pub mod conformity;
pub mod rates;

pub use classifier::{classify, classify_sheet, AliasTable, SheetMatch};
pub use conformity::{ConformityChecker, ConformityReport, ConformityStatistics, VerificationMode};
