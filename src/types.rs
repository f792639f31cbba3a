use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Raw cells
//==============================================================================

/// A spreadsheet cell as read from the workbook, before any normalization
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// A cell counts as empty when it holds nothing or only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::DateTime(d.and_time(chrono::NaiveTime::MIN))
    }
}

/// One spreadsheet row, positional
pub type RawCellRow = Vec<CellValue>;

//==============================================================================
// Product types
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    AmortizingCredit,
    Overdraft,
    Factoring,
    Guarantee,
    CommercialPaper,
    SpotCredit,
}

impl ProductType {
    /// Every product, in classification tie-break and reporting order
    pub const ALL: [ProductType; 6] = [
        ProductType::AmortizingCredit,
        ProductType::Overdraft,
        ProductType::Factoring,
        ProductType::Guarantee,
        ProductType::CommercialPaper,
        ProductType::SpotCredit,
    ];

    /// Stable machine key, used for sink file names and JSON output
    pub fn key(self) -> &'static str {
        match self {
            ProductType::AmortizingCredit => "amortizing_credit",
            ProductType::Overdraft => "overdraft",
            ProductType::Factoring => "factoring",
            ProductType::Guarantee => "guarantee",
            ProductType::CommercialPaper => "commercial_paper",
            ProductType::SpotCredit => "spot_credit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductType::AmortizingCredit => "amortizing credits",
            ProductType::Overdraft => "overdrafts",
            ProductType::Factoring => "factoring",
            ProductType::Guarantee => "guarantees",
            ProductType::CommercialPaper => "commercial paper",
            ProductType::SpotCredit => "spot credits",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

//==============================================================================
// Derived values
//==============================================================================

/// Coarse duration class of a credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityBucket {
    Short,
    Medium,
    Long,
}

impl MaturityBucket {
    pub fn from_months(months: i64) -> Self {
        if months <= 24 {
            MaturityBucket::Short
        } else if months > 60 {
            MaturityBucket::Long
        } else {
            MaturityBucket::Medium
        }
    }

    /// Reporting code used by the supervisory templates
    pub fn code(self) -> &'static str {
        match self {
            MaturityBucket::Short => "1-CT",
            MaturityBucket::Medium => "2-MT",
            MaturityBucket::Long => "3-LT",
        }
    }
}

/// Why a rate could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    ZeroPrincipal,
    ZeroDuration,
    MissingInstallment,
    NonPositiveNetAmount,
    NoConvergence,
    NotFinite,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DegenerateReason::ZeroPrincipal => "principal is zero or missing",
            DegenerateReason::ZeroDuration => "duration is zero or missing",
            DegenerateReason::MissingInstallment => "installment is zero or missing",
            DegenerateReason::NonPositiveNetAmount => "net amount is not positive",
            DegenerateReason::NoConvergence => "rate solver did not converge",
            DegenerateReason::NotFinite => "result is not a finite number",
        };
        f.write_str(text)
    }
}

/// Result of a rate calculation, as a percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RateOutcome {
    Computed(f64),
    Degenerate(DegenerateReason),
}

impl RateOutcome {
    /// Percentage value, `0.0` when the rate could not be computed
    pub fn value(&self) -> f64 {
        match self {
            RateOutcome::Computed(v) => *v,
            RateOutcome::Degenerate(_) => 0.0,
        }
    }

    pub fn computed(&self) -> Option<f64> {
        match self {
            RateOutcome::Computed(v) => Some(*v),
            RateOutcome::Degenerate(_) => None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, RateOutcome::Degenerate(_))
    }
}

//==============================================================================
// Product records
//==============================================================================

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOrigin {
    pub institution: String,
    pub sheet: String,
    /// 1-based spreadsheet row number
    pub row: usize,
}

/// Party and location columns shared by the short-term product templates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Counterparty {
    pub beneficiary: String,
    pub category: String,
    pub residence: String,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizingCredit {
    pub origin: RecordOrigin,
    pub institution_name: String,
    pub institution_code: String,
    pub disbursement_date: NaiveDate,
    pub originating_officer: String,
    pub loan_nature: String,
    pub counterparty: Counterparty,
    pub turnover: f64,
    pub headcount: i64,
    pub profession: String,
    pub principal: f64,
    pub duration_months: i64,
    pub deferral_months: i64,
    pub repayment_frequency: String,
    pub nominal_rate: f64,
    pub origination_fee: f64,
    pub insurance_payment_mode: String,
    pub insurance_amount: f64,
    pub ancillary_fees: f64,
    pub repayment_mode: String,
    pub installment: f64,
    pub disbursement_mode: String,
    pub claim_status: String,
    /// Fraction, e.g. `0.125`
    pub declared_rate: Option<f64>,
    pub maturity: MaturityBucket,
    /// Periodic effective rate, percentage
    pub periodic_rate: RateOutcome,
    /// Annualized effective rate, percentage
    pub calculated_rate: RateOutcome,
}

/// Spot credits share the amortizing template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotCredit {
    pub origin: RecordOrigin,
    pub institution_name: String,
    pub institution_code: String,
    pub disbursement_date: NaiveDate,
    pub originating_officer: String,
    pub loan_nature: String,
    pub counterparty: Counterparty,
    pub turnover: f64,
    pub headcount: i64,
    pub profession: String,
    pub principal: f64,
    pub duration_months: i64,
    pub deferral_months: i64,
    pub repayment_frequency: String,
    pub nominal_rate: f64,
    pub origination_fee: f64,
    pub insurance_payment_mode: String,
    pub insurance_amount: f64,
    pub ancillary_fees: f64,
    pub repayment_mode: String,
    pub installment: f64,
    pub disbursement_mode: String,
    pub claim_status: String,
    pub declared_rate: Option<f64>,
    pub maturity: MaturityBucket,
    pub calculated_rate: RateOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overdraft {
    pub origin: RecordOrigin,
    pub acronym: String,
    pub bank_code: String,
    pub start_date: NaiveDate,
    pub counterparty: Counterparty,
    pub amount: f64,
    pub cumulative_drawings: f64,
    pub nominal_rate: f64,
    pub fees_and_commissions: f64,
    pub insurance_cost: f64,
    pub ancillary_fees: f64,
    pub agios: f64,
    pub debtor_count: i64,
    pub claim_status: String,
    pub declared_rate: Option<f64>,
    pub calculated_rate: RateOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factoring {
    pub origin: RecordOrigin,
    pub acronym: String,
    pub bank_code: String,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub duration_days: i64,
    pub counterparty: Counterparty,
    pub receivable: f64,
    pub factoring_commission: f64,
    pub financing_commission: f64,
    pub ancillary_fees: f64,
    pub declared_rate: Option<f64>,
    pub calculated_rate: RateOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guarantee {
    pub origin: RecordOrigin,
    pub acronym: String,
    pub bank_code: String,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub duration_days: i64,
    pub counterparty: Counterparty,
    pub amount: f64,
    pub guarantee_rate: f64,
    pub commission_fees: f64,
    pub ancillary_fees: f64,
    pub declared_rate: Option<f64>,
    pub calculated_rate: RateOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommercialPaper {
    pub origin: RecordOrigin,
    pub acronym: String,
    pub bank_code: String,
    pub start_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub duration_days: i64,
    pub counterparty: Counterparty,
    pub nominal_rate: f64,
    pub face_amount: f64,
    pub file_fees: f64,
    pub commission: f64,
    pub other_fees: f64,
    pub declared_rate: Option<f64>,
    pub calculated_rate: RateOutcome,
}

/// Any extracted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum ProductRecord {
    AmortizingCredit(AmortizingCredit),
    Overdraft(Overdraft),
    Factoring(Factoring),
    Guarantee(Guarantee),
    CommercialPaper(CommercialPaper),
    SpotCredit(SpotCredit),
}

impl ProductRecord {
    pub fn product(&self) -> ProductType {
        match self {
            ProductRecord::AmortizingCredit(_) => ProductType::AmortizingCredit,
            ProductRecord::Overdraft(_) => ProductType::Overdraft,
            ProductRecord::Factoring(_) => ProductType::Factoring,
            ProductRecord::Guarantee(_) => ProductType::Guarantee,
            ProductRecord::CommercialPaper(_) => ProductType::CommercialPaper,
            ProductRecord::SpotCredit(_) => ProductType::SpotCredit,
        }
    }

    pub fn origin(&self) -> &RecordOrigin {
        match self {
            ProductRecord::AmortizingCredit(r) => &r.origin,
            ProductRecord::Overdraft(r) => &r.origin,
            ProductRecord::Factoring(r) => &r.origin,
            ProductRecord::Guarantee(r) => &r.origin,
            ProductRecord::CommercialPaper(r) => &r.origin,
            ProductRecord::SpotCredit(r) => &r.origin,
        }
    }

    /// Calculated effective rate (annualized for amortizing credits), percentage
    pub fn calculated_rate(&self) -> RateOutcome {
        match self {
            ProductRecord::AmortizingCredit(r) => r.calculated_rate,
            ProductRecord::Overdraft(r) => r.calculated_rate,
            ProductRecord::Factoring(r) => r.calculated_rate,
            ProductRecord::Guarantee(r) => r.calculated_rate,
            ProductRecord::CommercialPaper(r) => r.calculated_rate,
            ProductRecord::SpotCredit(r) => r.calculated_rate,
        }
    }

    /// Declared rate as a fraction
    pub fn declared_rate(&self) -> Option<f64> {
        match self {
            ProductRecord::AmortizingCredit(r) => r.declared_rate,
            ProductRecord::Overdraft(r) => r.declared_rate,
            ProductRecord::Factoring(r) => r.declared_rate,
            ProductRecord::Guarantee(r) => r.declared_rate,
            ProductRecord::CommercialPaper(r) => r.declared_rate,
            ProductRecord::SpotCredit(r) => r.declared_rate,
        }
    }
}
