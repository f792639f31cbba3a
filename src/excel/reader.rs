//! Workbook reader - Excel (.xlsx, .xls, .ods) → positional cell rows

use crate::error::{TegError, TegResult};
use crate::types::{CellValue, RawCellRow};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::{Path, PathBuf};

/// One worksheet; `rows[0]` is spreadsheet row 1
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    pub name: String,
    pub rows: Vec<RawCellRow>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, rows: Vec<RawCellRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Every worksheet of a file, in workbook order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
}

pub struct WorkbookReader {
    path: PathBuf,
}

impl WorkbookReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read every worksheet; any sheet that cannot be read fails the whole workbook
    pub fn read(&self) -> TegResult<Workbook> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            TegError::Workbook(format!(
                "Failed to open '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                TegError::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            tracing::debug!(sheet = %sheet_name, size = ?range.get_size(), "read worksheet");
            sheets.push(Worksheet::new(sheet_name, range_to_rows(&range)));
        }

        Ok(Workbook { sheets })
    }
}

/// Shorthand for `WorkbookReader::new(path).read()`
pub fn read_workbook<P: AsRef<Path>>(path: P) -> TegResult<Workbook> {
    WorkbookReader::new(path).read()
}

/// Lay a used range out at absolute positions.
///
/// calamine ranges start at the first used cell, so leading empty rows and
/// columns are padded back in. Every row gets the full sheet width.
fn range_to_rows(range: &Range<Data>) -> Vec<RawCellRow> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let start_row = start_row as usize;
    let start_col = start_col as usize;
    let width = start_col + range.width();

    let mut rows = Vec::with_capacity(start_row + range.height());
    rows.extend((0..start_row).map(|_| vec![CellValue::Empty; width]));

    for data_row in range.rows() {
        let mut row = vec![CellValue::Empty; start_col];
        row.extend(data_row.iter().map(convert_cell));
        row.resize(width, CellValue::Empty);
        rows.push(row);
    }
    rows
}

/// Convert a calamine cell to a [`CellValue`]
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // as_datetime honors the workbook's 1904 date system
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_convert_scalars() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(convert_cell(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(convert_cell(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(
            convert_cell(&Data::String("CA".to_string())),
            CellValue::Text("CA".to_string())
        );
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }

    #[test]
    fn test_convert_iso_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-15".to_string())),
            CellValue::from(expected)
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2024-01-15T00:00:00".to_string())),
            CellValue::from(expected)
        );
    }

    fn date_cell(serial: f64, is_1904: bool) -> Data {
        Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        ))
    }

    #[test]
    fn test_date_cell_keeps_time() {
        // 45306.5 = 2024-01-15 12:00
        match convert_cell(&date_cell(45306.5, false)) {
            CellValue::DateTime(dt) => {
                assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
                assert_eq!(dt.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
            }
            other => panic!("expected a date, got {:?}", other),
        }
    }

    #[test]
    fn test_date_cell_1904_system() {
        // 1904 serials count from 1904-01-01, 1462 days after the 1900 epoch
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(convert_cell(&date_cell(43844.0, true)), CellValue::from(expected));
        assert_eq!(convert_cell(&date_cell(45306.0, false)), CellValue::from(expected));
    }

    #[test]
    fn test_range_padding_is_absolute() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("header".to_string()));
        range.set_value((3, 2), Data::Int(5));

        let rows = range_to_rows(&range);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].iter().all(|c| c.is_blank()));
        assert_eq!(rows[2].len(), 3);
        assert_eq!(rows[2][1], CellValue::Text("header".to_string()));
        assert_eq!(rows[3][2], CellValue::Int(5));
        assert_eq!(rows[3][0], CellValue::Empty);
    }

    #[test]
    fn test_missing_file_is_workbook_error() {
        let result = read_workbook("/nonexistent/submission.xlsx");
        assert!(matches!(result, Err(TegError::Workbook(_))));
    }
}
