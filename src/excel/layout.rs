//! Column layout of each product worksheet
//!
//! The submission template fixes every field at a zero-based column offset.
//! That positional contract lives here and nowhere else: extractors ask a
//! [`ParsedRow`] for fields by name, never by index.

use chrono::NaiveDate;

use crate::normalize::{normalize_rate, parse_number, to_date, to_integer, to_number, to_text};
use crate::types::{CellValue, ProductType};

/// How a column is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    /// Monetary amount, `0.0` when blank
    Amount,
    /// Integer count or duration
    Count { default: i64 },
    /// Fraction or percentage, brought to fraction; blank stays blank
    Rate,
}

/// One column of the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: usize,
    pub kind: FieldKind,
    /// Rows where this field does not parse (or, for counts, is not positive) are rejected
    pub required: bool,
}

const fn field(name: &'static str, column: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        column,
        kind,
        required: false,
    }
}

const fn required(name: &'static str, column: usize, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        column,
        kind,
        required: true,
    }
}

const TEXT: FieldKind = FieldKind::Text;
const DATE: FieldKind = FieldKind::Date;
const AMOUNT: FieldKind = FieldKind::Amount;
const RATE: FieldKind = FieldKind::Rate;
const COUNT: FieldKind = FieldKind::Count { default: 0 };

/// Expected shape of a product worksheet row
#[derive(Debug)]
pub struct RowShape {
    pub product: ProductType,
    pub min_columns: usize,
    pub fields: &'static [FieldSpec],
}

impl RowShape {
    pub fn for_product(product: ProductType) -> &'static RowShape {
        match product {
            ProductType::AmortizingCredit => &AMORTIZING_CREDIT,
            ProductType::Overdraft => &OVERDRAFT,
            ProductType::Factoring => &FACTORING,
            ProductType::Guarantee => &GUARANTEE,
            ProductType::CommercialPaper => &COMMERCIAL_PAPER,
            ProductType::SpotCredit => &SPOT_CREDIT,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

const CREDIT_FIELDS: [FieldSpec; 26] = [
    field("institution_name", 0, TEXT),
    field("institution_code", 1, TEXT),
    required("disbursement_date", 2, DATE),
    field("originating_officer", 3, TEXT),
    field("loan_nature", 4, TEXT),
    field("beneficiary", 5, TEXT),
    field("category", 6, TEXT),
    field("residence", 7, TEXT),
    field("sector", 8, TEXT),
    field("turnover", 9, AMOUNT),
    field("headcount", 10, COUNT),
    field("profession", 11, TEXT),
    field("principal", 12, AMOUNT),
    field("duration_months", 13, COUNT),
    field("deferral_months", 14, COUNT),
    field("repayment_frequency", 15, TEXT),
    field("nominal_rate", 16, RATE),
    field("origination_fee", 17, AMOUNT),
    field("insurance_payment_mode", 18, TEXT),
    field("insurance_amount", 19, AMOUNT),
    field("ancillary_fees", 20, AMOUNT),
    field("repayment_mode", 21, TEXT),
    field("installment", 22, AMOUNT),
    field("disbursement_mode", 23, TEXT),
    field("claim_status", 24, TEXT),
    field("declared_rate", 25, RATE),
];

pub static AMORTIZING_CREDIT: RowShape = RowShape {
    product: ProductType::AmortizingCredit,
    min_columns: 26,
    fields: &CREDIT_FIELDS,
};

pub static SPOT_CREDIT: RowShape = RowShape {
    product: ProductType::SpotCredit,
    min_columns: 26,
    fields: &CREDIT_FIELDS,
};

pub static OVERDRAFT: RowShape = RowShape {
    product: ProductType::Overdraft,
    min_columns: 17,
    fields: &[
        field("acronym", 0, TEXT),
        field("bank_code", 1, TEXT),
        required("start_date", 2, DATE),
        field("beneficiary", 3, TEXT),
        field("category", 4, TEXT),
        field("residence", 5, TEXT),
        field("sector", 6, TEXT),
        field("amount", 7, AMOUNT),
        field("cumulative_drawings", 8, AMOUNT),
        field("nominal_rate", 9, RATE),
        field("fees_and_commissions", 10, AMOUNT),
        field("insurance_cost", 11, AMOUNT),
        field("ancillary_fees", 12, AMOUNT),
        field("agios", 13, AMOUNT),
        field("debtor_count", 14, FieldKind::Count { default: 1 }),
        field("claim_status", 15, TEXT),
        field("declared_rate", 16, RATE),
    ],
};

pub static FACTORING: RowShape = RowShape {
    product: ProductType::Factoring,
    min_columns: 14,
    fields: &[
        field("acronym", 0, TEXT),
        field("bank_code", 1, TEXT),
        required("start_date", 2, DATE),
        field("due_date", 3, DATE),
        required("duration_days", 4, COUNT),
        field("beneficiary", 5, TEXT),
        field("category", 6, TEXT),
        field("residence", 7, TEXT),
        field("sector", 8, TEXT),
        field("receivable", 9, AMOUNT),
        field("factoring_commission", 10, AMOUNT),
        field("financing_commission", 11, AMOUNT),
        field("ancillary_fees", 12, AMOUNT),
        field("declared_rate", 13, RATE),
    ],
};

pub static GUARANTEE: RowShape = RowShape {
    product: ProductType::Guarantee,
    min_columns: 14,
    fields: &[
        field("acronym", 0, TEXT),
        field("bank_code", 1, TEXT),
        required("start_date", 2, DATE),
        field("due_date", 3, DATE),
        field("duration_days", 4, COUNT),
        field("beneficiary", 5, TEXT),
        field("category", 6, TEXT),
        field("residence", 7, TEXT),
        field("sector", 8, TEXT),
        field("amount", 9, AMOUNT),
        field("guarantee_rate", 10, RATE),
        field("commission_fees", 11, AMOUNT),
        field("ancillary_fees", 12, AMOUNT),
        field("declared_rate", 13, RATE),
    ],
};

pub static COMMERCIAL_PAPER: RowShape = RowShape {
    product: ProductType::CommercialPaper,
    min_columns: 15,
    fields: &[
        field("acronym", 0, TEXT),
        field("bank_code", 1, TEXT),
        required("start_date", 2, DATE),
        field("due_date", 3, DATE),
        field("duration_days", 4, COUNT),
        field("beneficiary", 5, TEXT),
        field("category", 6, TEXT),
        field("residence", 7, TEXT),
        field("sector", 8, TEXT),
        field("nominal_rate", 9, RATE),
        field("face_amount", 10, AMOUNT),
        field("file_fees", 11, AMOUNT),
        field("commission", 12, AMOUNT),
        field("other_fees", 13, AMOUNT),
        field("declared_rate", 14, RATE),
    ],
};

/// A normalized column value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Amount(f64),
    Count(i64),
    Rate(Option<f64>),
}

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RowRejection {
    InsufficientColumns { found: usize, required: usize },
    InvalidField { field: &'static str, raw: String },
}

/// A row normalized against its [`RowShape`]
#[derive(Debug)]
pub struct ParsedRow {
    shape: &'static RowShape,
    values: Vec<FieldValue>,
}

fn normalize_field(spec: &FieldSpec, cell: &CellValue) -> FieldValue {
    match spec.kind {
        FieldKind::Text => FieldValue::Text(to_text(cell)),
        FieldKind::Date => FieldValue::Date(to_date(cell)),
        FieldKind::Amount => FieldValue::Amount(to_number(cell, 0.0)),
        FieldKind::Count { default } => FieldValue::Count(to_integer(cell, default)),
        FieldKind::Rate => FieldValue::Rate(parse_number(cell).map(normalize_rate)),
    }
}

fn is_missing(value: &FieldValue) -> bool {
    match value {
        FieldValue::Date(d) => d.is_none(),
        FieldValue::Count(n) => *n <= 0,
        FieldValue::Rate(r) => r.is_none(),
        FieldValue::Text(s) => s.is_empty(),
        FieldValue::Amount(_) => false,
    }
}

impl ParsedRow {
    /// Normalize every field of `cells`; rejects short rows and missing required fields
    pub fn parse(shape: &'static RowShape, cells: &[CellValue]) -> Result<Self, RowRejection> {
        if cells.len() < shape.min_columns {
            return Err(RowRejection::InsufficientColumns {
                found: cells.len(),
                required: shape.min_columns,
            });
        }

        let mut values = Vec::with_capacity(shape.fields.len());
        for spec in shape.fields {
            let cell = cells.get(spec.column).unwrap_or(&CellValue::Empty);
            let value = normalize_field(spec, cell);
            if spec.required && is_missing(&value) {
                return Err(RowRejection::InvalidField {
                    field: spec.name,
                    raw: to_text(cell),
                });
            }
            values.push(value);
        }

        Ok(Self { shape, values })
    }

    fn get(&self, name: &str) -> Option<&FieldValue> {
        let position = self.shape.position(name);
        debug_assert!(
            position.is_some(),
            "field '{}' is not part of the {} layout",
            name,
            self.shape.product
        );
        position.and_then(|i| self.values.get(i))
    }

    pub fn text(&self, name: &str) -> String {
        match self.get(name) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name) {
            Some(FieldValue::Date(d)) => *d,
            _ => None,
        }
    }

    pub fn amount(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(FieldValue::Amount(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn count(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(FieldValue::Count(n)) => *n,
            _ => 0,
        }
    }

    pub fn rate(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(FieldValue::Rate(r)) => *r,
            _ => None,
        }
    }
}
