//! Fixture workbooks for integration tests

#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::path::{Path, PathBuf};

pub enum Cell {
    Text(&'static str),
    Num(f64),
    Date(u16, u8, u8),
}

pub struct SheetFixture {
    pub name: &'static str,
    /// Zero-based row of the header
    pub header_row: u32,
    pub width: u16,
    /// Data rows written right below the header, as (column, value) pairs
    pub rows: Vec<Vec<(u16, Cell)>>,
}

pub fn write_workbook(path: &Path, sheets: &[SheetFixture]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    for fixture in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(fixture.name).unwrap();
        for col in 0..fixture.width {
            worksheet
                .write_string(fixture.header_row, col, format!("COL_{}", col))
                .unwrap();
        }
        for (i, row) in fixture.rows.iter().enumerate() {
            let r = fixture.header_row + 1 + i as u32;
            for (col, cell) in row {
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, *col, *s).unwrap();
                    }
                    Cell::Num(n) => {
                        worksheet.write_number(r, *col, *n).unwrap();
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                        worksheet
                            .write_datetime_with_format(r, *col, &date, &date_format)
                            .unwrap();
                    }
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

/// Overdraft row: amount 100000, nominal 10%, fees 2000 + 500 + 0 → 12.50%
pub fn overdraft_row(declared: f64) -> Vec<(u16, Cell)> {
    vec![
        (0, Cell::Text("BNK")),
        (1, Cell::Text("B001")),
        (2, Cell::Text("15/01/2024")),
        (3, Cell::Text("ACME SARL")),
        (7, Cell::Num(100_000.0)),
        (9, Cell::Num(0.10)),
        (10, Cell::Num(2_000.0)),
        (11, Cell::Num(500.0)),
        (12, Cell::Num(0.0)),
        (16, Cell::Num(declared)),
    ]
}

/// Factoring row: receivable 500000 over 90 days, fees 10000 → 8.00%
pub fn factoring_row() -> Vec<(u16, Cell)> {
    vec![
        (0, Cell::Text("BNK")),
        (2, Cell::Date(2024, 3, 1)),
        (4, Cell::Num(90.0)),
        (9, Cell::Num(500_000.0)),
        (10, Cell::Num(4_000.0)),
        (11, Cell::Num(6_000.0)),
        (13, Cell::Text("8")),
    ]
}

/// A submission with two overdrafts (one off by 7.5 points), one factoring
/// line, an amortizing sheet whose only row is 10 columns wide and an
/// unrelated summary sheet.
pub fn sample_submission(dir: &Path) -> PathBuf {
    let path = dir.join("BNK01.xlsx");
    write_workbook(
        &path,
        &[
            SheetFixture {
                name: "Découverts Bancaires 2024",
                header_row: 0,
                width: 17,
                rows: vec![overdraft_row(0.125), overdraft_row(0.2)],
            },
            SheetFixture {
                name: "AFF",
                header_row: 0,
                width: 14,
                rows: vec![factoring_row()],
            },
            SheetFixture {
                name: "CA",
                header_row: 0,
                width: 10,
                rows: vec![(0..10).map(|c| (c, Cell::Text("x"))).collect()],
            },
            SheetFixture {
                name: "Synthèse",
                header_row: 0,
                width: 3,
                rows: vec![],
            },
        ],
    );
    path
}
