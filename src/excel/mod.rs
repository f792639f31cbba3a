//! Spreadsheet input
//!
//! - Reader: workbook file → positional cell rows per worksheet
//! - Layout: column contract of each product template
//! - Extractor: cell rows → typed product records

pub mod extractor;
pub mod layout;
pub mod reader;

pub use extractor::{extract_sheet, ExtractionResult};
pub use reader::{read_workbook, Workbook, WorkbookReader, Worksheet};
