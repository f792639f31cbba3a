//! Product row extractors
//!
//! Every extractor runs the same pass over a worksheet: locate the header,
//! skip blank rows, parse each row against the product's [`RowShape`], build
//! the typed record and compute its effective rate. Rejected rows become
//! error strings; they never stop the sheet.

use std::collections::BTreeMap;

use crate::core::rates::{
    amortizing_credit_rate, commercial_paper_rate, factoring_rate, guarantee_rate,
    overdraft_rate, spot_credit_rate, AmortizingInputs,
};
use crate::excel::layout::{ParsedRow, RowRejection, RowShape};
use crate::excel::reader::Worksheet;
use crate::types::{
    AmortizingCredit, CellValue, CommercialPaper, Counterparty, Factoring, Guarantee,
    MaturityBucket, Overdraft, ProductRecord, ProductType, RecordOrigin, SpotCredit,
};

/// Records and row errors of one or more sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub records: BTreeMap<ProductType, Vec<ProductRecord>>,
    pub errors: Vec<String>,
}

impl ExtractionResult {
    pub fn push(&mut self, record: ProductRecord) {
        self.records.entry(record.product()).or_default().push(record);
    }

    /// Records of one product, empty when none were extracted
    pub fn of(&self, product: ProductType) -> &[ProductRecord] {
        self.records.get(&product).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, product: ProductType) -> usize {
        self.of(product).len()
    }

    pub fn total(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// All records, product by product
    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.records.values().flatten()
    }

    pub fn merge(&mut self, other: ExtractionResult) {
        for (product, records) in other.records {
            self.records.entry(product).or_default().extend(records);
        }
        self.errors.extend(other.errors);
    }
}

/// Index of the first non-blank row among the first `scan_rows`
pub fn find_header_row(rows: &[Vec<CellValue>], scan_rows: usize) -> Option<usize> {
    rows.iter()
        .take(scan_rows)
        .position(|row| row.iter().any(|c| !c.is_blank()))
}

type RecordBuilder = fn(&ParsedRow, RecordOrigin) -> ProductRecord;

fn builder_for(product: ProductType) -> RecordBuilder {
    match product {
        ProductType::AmortizingCredit => build_amortizing_credit,
        ProductType::Overdraft => build_overdraft,
        ProductType::Factoring => build_factoring,
        ProductType::Guarantee => build_guarantee,
        ProductType::CommercialPaper => build_commercial_paper,
        ProductType::SpotCredit => build_spot_credit,
    }
}

/// Extract every record of `product` from a worksheet
pub fn extract_sheet(
    product: ProductType,
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    let shape = RowShape::for_product(product);
    let build = builder_for(product);
    let mut result = ExtractionResult::default();

    let Some(header) = find_header_row(&sheet.rows, header_scan_rows) else {
        result
            .errors
            .push(format!("Sheet '{}': no header row found", sheet.name));
        tracing::warn!(sheet = %sheet.name, "no header row found");
        return result;
    };

    for (index, cells) in sheet.rows.iter().enumerate().skip(header + 1) {
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        let row_number = index + 1;

        match ParsedRow::parse(shape, cells) {
            Ok(row) => {
                let origin = RecordOrigin {
                    institution: institution.to_string(),
                    sheet: sheet.name.clone(),
                    row: row_number,
                };
                result.push(build(&row, origin));
            }
            Err(rejection) => {
                let message = row_error(&sheet.name, row_number, &rejection);
                tracing::debug!("{}", message);
                result.errors.push(message);
            }
        }
    }

    tracing::info!(
        sheet = %sheet.name,
        product = %product,
        records = result.total(),
        errors = result.errors.len(),
        "sheet extracted"
    );
    result
}

fn row_error(sheet: &str, row: usize, rejection: &RowRejection) -> String {
    match rejection {
        RowRejection::InsufficientColumns { found, required } => format!(
            "Sheet '{}', row {}: insufficient columns ({}/{})",
            sheet, row, found, required
        ),
        RowRejection::InvalidField { field, raw } if raw.is_empty() => {
            format!("Sheet '{}', row {}: missing {}", sheet, row, field)
        }
        RowRejection::InvalidField { field, raw } => format!(
            "Sheet '{}', row {}: invalid {} '{}'",
            sheet, row, field, raw
        ),
    }
}

pub fn extract_amortizing_credits(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::AmortizingCredit, sheet, institution, header_scan_rows)
}

pub fn extract_overdrafts(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::Overdraft, sheet, institution, header_scan_rows)
}

pub fn extract_factoring(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::Factoring, sheet, institution, header_scan_rows)
}

pub fn extract_guarantees(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::Guarantee, sheet, institution, header_scan_rows)
}

pub fn extract_commercial_paper(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::CommercialPaper, sheet, institution, header_scan_rows)
}

pub fn extract_spot_credits(
    sheet: &Worksheet,
    institution: &str,
    header_scan_rows: usize,
) -> ExtractionResult {
    extract_sheet(ProductType::SpotCredit, sheet, institution, header_scan_rows)
}

//==============================================================================
// Record builders
//==============================================================================

fn counterparty(row: &ParsedRow) -> Counterparty {
    Counterparty {
        beneficiary: row.text("beneficiary"),
        category: row.text("category"),
        residence: row.text("residence"),
        sector: row.text("sector"),
    }
}

/// Required dates are validated by [`ParsedRow::parse`]
fn start_date(row: &ParsedRow, name: &str) -> chrono::NaiveDate {
    row.date(name).unwrap_or_default()
}

fn build_amortizing_credit(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let inputs = AmortizingInputs {
        principal: row.amount("principal"),
        duration_periods: row.count("duration_months"),
        installment: row.amount("installment"),
        origination_fee: row.amount("origination_fee"),
        insurance: row.amount("insurance_amount"),
        ancillary_fees: row.amount("ancillary_fees"),
    };
    let frequency = row.text("repayment_frequency");
    let rates = amortizing_credit_rate(&inputs, &frequency);

    ProductRecord::AmortizingCredit(AmortizingCredit {
        origin,
        institution_name: row.text("institution_name"),
        institution_code: row.text("institution_code"),
        disbursement_date: start_date(row, "disbursement_date"),
        originating_officer: row.text("originating_officer"),
        loan_nature: row.text("loan_nature"),
        counterparty: counterparty(row),
        turnover: row.amount("turnover"),
        headcount: row.count("headcount"),
        profession: row.text("profession"),
        principal: inputs.principal,
        duration_months: inputs.duration_periods,
        deferral_months: row.count("deferral_months"),
        repayment_frequency: frequency,
        nominal_rate: row.rate("nominal_rate").unwrap_or(0.0),
        origination_fee: inputs.origination_fee,
        insurance_payment_mode: row.text("insurance_payment_mode"),
        insurance_amount: inputs.insurance,
        ancillary_fees: inputs.ancillary_fees,
        repayment_mode: row.text("repayment_mode"),
        installment: inputs.installment,
        disbursement_mode: row.text("disbursement_mode"),
        claim_status: row.text("claim_status"),
        declared_rate: row.rate("declared_rate"),
        maturity: MaturityBucket::from_months(inputs.duration_periods),
        periodic_rate: rates.periodic,
        calculated_rate: rates.annualized,
    })
}

fn build_spot_credit(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let principal = row.amount("principal");
    let duration_months = row.count("duration_months");
    let installment = row.amount("installment");
    let origination_fee = row.amount("origination_fee");
    let insurance_amount = row.amount("insurance_amount");
    let ancillary_fees = row.amount("ancillary_fees");

    ProductRecord::SpotCredit(SpotCredit {
        origin,
        institution_name: row.text("institution_name"),
        institution_code: row.text("institution_code"),
        disbursement_date: start_date(row, "disbursement_date"),
        originating_officer: row.text("originating_officer"),
        loan_nature: row.text("loan_nature"),
        counterparty: counterparty(row),
        turnover: row.amount("turnover"),
        headcount: row.count("headcount"),
        profession: row.text("profession"),
        principal,
        duration_months,
        deferral_months: row.count("deferral_months"),
        repayment_frequency: row.text("repayment_frequency"),
        nominal_rate: row.rate("nominal_rate").unwrap_or(0.0),
        origination_fee,
        insurance_payment_mode: row.text("insurance_payment_mode"),
        insurance_amount,
        ancillary_fees,
        repayment_mode: row.text("repayment_mode"),
        installment,
        disbursement_mode: row.text("disbursement_mode"),
        claim_status: row.text("claim_status"),
        declared_rate: row.rate("declared_rate"),
        maturity: MaturityBucket::from_months(duration_months),
        calculated_rate: spot_credit_rate(
            principal,
            duration_months,
            installment,
            &[origination_fee, insurance_amount, ancillary_fees],
        ),
    })
}

fn build_overdraft(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let amount = row.amount("amount");
    let nominal_rate = row.rate("nominal_rate").unwrap_or(0.0);
    let fees_and_commissions = row.amount("fees_and_commissions");
    let insurance_cost = row.amount("insurance_cost");
    let ancillary_fees = row.amount("ancillary_fees");

    ProductRecord::Overdraft(Overdraft {
        origin,
        acronym: row.text("acronym"),
        bank_code: row.text("bank_code"),
        start_date: start_date(row, "start_date"),
        counterparty: counterparty(row),
        amount,
        cumulative_drawings: row.amount("cumulative_drawings"),
        nominal_rate,
        fees_and_commissions,
        insurance_cost,
        ancillary_fees,
        agios: row.amount("agios"),
        debtor_count: row.count("debtor_count"),
        claim_status: row.text("claim_status"),
        declared_rate: row.rate("declared_rate"),
        calculated_rate: overdraft_rate(
            amount,
            nominal_rate,
            &[fees_and_commissions, insurance_cost, ancillary_fees],
        ),
    })
}

fn build_factoring(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let duration_days = row.count("duration_days");
    let receivable = row.amount("receivable");
    let factoring_commission = row.amount("factoring_commission");
    let financing_commission = row.amount("financing_commission");
    let ancillary_fees = row.amount("ancillary_fees");

    ProductRecord::Factoring(Factoring {
        origin,
        acronym: row.text("acronym"),
        bank_code: row.text("bank_code"),
        start_date: start_date(row, "start_date"),
        due_date: row.date("due_date"),
        duration_days,
        counterparty: counterparty(row),
        receivable,
        factoring_commission,
        financing_commission,
        ancillary_fees,
        declared_rate: row.rate("declared_rate"),
        calculated_rate: factoring_rate(
            receivable,
            duration_days,
            &[factoring_commission, financing_commission, ancillary_fees],
        ),
    })
}

fn build_guarantee(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let duration_days = row.count("duration_days");
    let amount = row.amount("amount");
    let rate = row.rate("guarantee_rate").unwrap_or(0.0);
    let commission_fees = row.amount("commission_fees");
    let ancillary_fees = row.amount("ancillary_fees");

    ProductRecord::Guarantee(Guarantee {
        origin,
        acronym: row.text("acronym"),
        bank_code: row.text("bank_code"),
        start_date: start_date(row, "start_date"),
        due_date: row.date("due_date"),
        duration_days,
        counterparty: counterparty(row),
        amount,
        guarantee_rate: rate,
        commission_fees,
        ancillary_fees,
        declared_rate: row.rate("declared_rate"),
        calculated_rate: guarantee_rate(amount, duration_days, rate, commission_fees, ancillary_fees),
    })
}

fn build_commercial_paper(row: &ParsedRow, origin: RecordOrigin) -> ProductRecord {
    let duration_days = row.count("duration_days");
    let nominal_rate = row.rate("nominal_rate").unwrap_or(0.0);
    let face_amount = row.amount("face_amount");
    let commission = row.amount("commission");
    let other_fees = row.amount("other_fees");

    ProductRecord::CommercialPaper(CommercialPaper {
        origin,
        acronym: row.text("acronym"),
        bank_code: row.text("bank_code"),
        start_date: start_date(row, "start_date"),
        due_date: row.date("due_date"),
        duration_days,
        counterparty: counterparty(row),
        nominal_rate,
        face_amount,
        file_fees: row.amount("file_fees"),
        commission,
        other_fees,
        declared_rate: row.rate("declared_rate"),
        calculated_rate: commercial_paper_rate(
            face_amount,
            duration_days,
            nominal_rate,
            commission,
            other_fees,
        ),
    })
}
