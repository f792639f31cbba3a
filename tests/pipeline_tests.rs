//! Extraction, rate and conformity behavior over in-memory worksheets

use pretty_assertions::assert_eq;
use teg_verify::core::classifier::{
    classify, classify_sheet, score_sheet, AliasEntry, AliasTable, SheetMatch, EXACT_MATCH_SCORE,
};
use teg_verify::core::conformity::{rates_conform, ConformityChecker, BATCH_TOLERANCE};
use teg_verify::core::rates::{
    amortizing_credit_rate, commercial_paper_rate, factoring_rate, guarantee_rate,
    overdraft_rate, spot_credit_rate, AmortizingInputs,
};
use teg_verify::excel::extractor::{
    extract_amortizing_credits, extract_commercial_paper, extract_factoring, extract_guarantees,
    extract_overdrafts, extract_spot_credits,
};
use teg_verify::excel::Worksheet;
use teg_verify::normalize::{normalize_rate, parse_number, to_date, to_integer, to_number};
use teg_verify::types::{CellValue, MaturityBucket, ProductRecord, ProductType, RateOutcome};

fn header(width: usize) -> Vec<CellValue> {
    (0..width)
        .map(|i| CellValue::Text(format!("COL_{}", i)))
        .collect()
}

fn row(width: usize, cells: &[(usize, CellValue)]) -> Vec<CellValue> {
    let mut row = vec![CellValue::Empty; width];
    for (col, value) in cells {
        row[*col] = value.clone();
    }
    row
}

fn sheet(name: &str, width: usize, rows: Vec<Vec<CellValue>>) -> Worksheet {
    let mut all = vec![header(width)];
    all.extend(rows);
    Worksheet::new(name, all)
}

// ═══════════════════════════════════════════════════════════════════════════
// END-TO-END SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_overdraft_scenario() {
    let ws = sheet(
        "DEC",
        17,
        vec![row(
            17,
            &[
                (2, "15/01/2024".into()),
                (7, 100_000.0.into()),
                (9, 0.10.into()),
                (10, 2_000.0.into()),
                (11, 500.0.into()),
                (12, 0.0.into()),
            ],
        )],
    );
    let result = extract_overdrafts(&ws, "BNK", 10);
    assert_eq!(
        result.of(ProductType::Overdraft)[0].calculated_rate(),
        RateOutcome::Computed(12.5)
    );
}

#[test]
fn test_factoring_scenario() {
    let ws = sheet(
        "AFF",
        14,
        vec![row(
            14,
            &[
                (2, "2024-03-01".into()),
                (4, 90.0.into()),
                (9, 500_000.0.into()),
                (10, 7_500.0.into()),
                (11, 2_500.0.into()),
            ],
        )],
    );
    let result = extract_factoring(&ws, "BNK", 10);
    assert_eq!(
        result.of(ProductType::Factoring)[0].calculated_rate(),
        RateOutcome::Computed(8.0)
    );
}

#[test]
fn test_classification_scenario() {
    let table = AliasTable::default();
    assert_eq!(
        classify("Découverts Bancaires 2024", &table),
        Some(ProductType::Overdraft)
    );
}

#[test]
fn test_short_amortizing_row_scenario() {
    let ws = sheet(
        "CA",
        26,
        vec![(0..10).map(CellValue::Int).collect()],
    );
    let result = extract_amortizing_credits(&ws, "BNK", 10);
    assert_eq!(result.total(), 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("26"));
    assert!(result.errors[0].contains("10"));
}

#[test]
fn test_conformity_scenario() {
    let verdict = ConformityChecker::batch().verify(8.45, 0.085);
    assert!(verdict.conformant);
    assert!((verdict.difference - 0.0005).abs() < 1e-12);
}

#[test]
fn test_zero_rates_left_out_of_simplified_statistics() {
    let zero = row(
        17,
        &[
            (2, "15/01/2024".into()),
            (7, 50_000.0.into()),
            (9, 0.0.into()),
            (16, 0.0.into()),
        ],
    );
    let degenerate = row(
        17,
        &[(2, "15/01/2024".into()), (9, 0.1.into()), (16, 0.1.into())],
    );
    let ws = sheet("DEC", 17, vec![zero, degenerate]);
    let result = extract_overdrafts(&ws, "BNK", 10);
    let records = result.of(ProductType::Overdraft);
    assert_eq!(records.len(), 2);

    let batch = ConformityChecker::batch().check_all(records).statistics.global;
    assert_eq!(batch.conformant, 1);
    assert_eq!(batch.unverified, 1);
    assert_eq!(batch.skipped_zero, 0);

    let simplified = ConformityChecker::simplified().check_all(records).statistics.global;
    assert_eq!(simplified.total, 0);
    assert_eq!(simplified.unverified, 1);
    assert_eq!(simplified.skipped_zero, 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_normalizer_is_total() {
    let samples = vec![
        CellValue::Empty,
        CellValue::from(""),
        CellValue::from("-"),
        CellValue::from("N/A"),
        CellValue::from("abc"),
        CellValue::from("1.2.3,4"),
        CellValue::from("--"),
        CellValue::Number(f64::NAN),
        CellValue::Number(f64::INFINITY),
        CellValue::Bool(true),
        CellValue::Int(i64::MAX),
    ];
    for value in &samples {
        let n = to_number(value, -1.0);
        assert!(n.is_finite(), "{:?} -> {}", value, n);
        let _ = to_integer(value, 0);
        let _ = to_date(value);
    }
    assert_eq!(to_number(&CellValue::from("N/A"), 7.0), 7.0);
    assert_eq!(parse_number(&CellValue::from("1 250 000,50")), Some(1_250_000.5));
}

#[test]
fn test_rate_normalization_is_idempotent() {
    for rate in [0.0, 0.085, 0.5, 1.0, 8.5, 12.0, 150.0] {
        let once = normalize_rate(rate);
        assert!(once <= 1.0 || rate > 100.0);
        if rate <= 100.0 {
            assert_eq!(normalize_rate(once), once);
        }
    }
}

#[test]
fn test_maturity_boundaries() {
    assert_eq!(MaturityBucket::from_months(24), MaturityBucket::Short);
    assert_eq!(MaturityBucket::from_months(25), MaturityBucket::Medium);
    assert_eq!(MaturityBucket::from_months(60), MaturityBucket::Medium);
    assert_eq!(MaturityBucket::from_months(61), MaturityBucket::Long);
}

#[test]
fn test_degenerate_inputs_yield_zero() {
    let outcomes = [
        overdraft_rate(0.0, 0.1, &[100.0]),
        factoring_rate(0.0, 90, &[100.0]),
        factoring_rate(1_000.0, 0, &[100.0]),
        guarantee_rate(0.0, 90, 0.02, 0.0, 0.0),
        guarantee_rate(1_000.0, 0, 0.02, 0.0, 0.0),
        commercial_paper_rate(0.0, 90, 0.1, 0.0, 0.0),
        commercial_paper_rate(1_000.0, 0, 0.1, 0.0, 0.0),
        spot_credit_rate(0.0, 12, 1_100.0, &[]),
        spot_credit_rate(1_000.0, 0, 1_100.0, &[]),
        amortizing_credit_rate(&AmortizingInputs::default(), "mensuel").annualized,
    ];
    for outcome in outcomes {
        assert!(outcome.is_degenerate(), "{:?}", outcome);
        assert_eq!(outcome.value(), 0.0);
    }
}

#[test]
fn test_conformity_is_symmetric() {
    let pairs = [(0.1, 0.1009), (0.1, 0.1011), (0.0, 0.0), (0.05, 0.0)];
    for (a, b) in pairs {
        assert_eq!(
            rates_conform(a, b, BATCH_TOLERANCE),
            rates_conform(b, a, BATCH_TOLERANCE)
        );
    }
}

#[test]
fn test_exact_match_outranks_partial() {
    let table = AliasTable::default();
    assert_eq!(
        classify_sheet("credit", &table),
        SheetMatch::Exact(ProductType::AmortizingCredit)
    );
    assert_eq!(
        classify_sheet("EFFETS", &table),
        SheetMatch::Exact(ProductType::CommercialPaper)
    );
}

#[test]
fn test_exact_match_beats_larger_partial_total() {
    let table = AliasTable {
        version: "test".to_string(),
        entries: vec![
            AliasEntry {
                product: ProductType::Guarantee,
                aliases: (1..=12).map(|i| format!("effets {}", i)).collect(),
            },
            AliasEntry {
                product: ProductType::CommercialPaper,
                aliases: vec!["ec".to_string(), "effets".to_string()],
            },
        ],
    };

    let scores = score_sheet("Effets", &table);
    assert!(scores[0].1 > EXACT_MATCH_SCORE, "{:?}", scores);
    assert_eq!(
        classify_sheet("Effets", &table),
        SheetMatch::Exact(ProductType::CommercialPaper)
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// PER-PRODUCT EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_guarantee_extraction() {
    let ws = sheet(
        "Cautions",
        14,
        vec![row(
            14,
            &[
                (2, "01/06/2024".into()),
                (4, 180.0.into()),
                (9, 1_000_000.0.into()),
                (10, "2%".into()),
                (13, 2.0.into()),
            ],
        )],
    );
    let result = extract_guarantees(&ws, "BNK", 10);
    match &result.of(ProductType::Guarantee)[0] {
        ProductRecord::Guarantee(g) => {
            assert_eq!(g.guarantee_rate, 0.02);
            assert_eq!(g.calculated_rate, RateOutcome::Computed(2.0));
            assert_eq!(g.declared_rate, Some(0.02));
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_commercial_paper_extraction() {
    let ws = sheet(
        "EC",
        15,
        vec![row(
            15,
            &[
                (2, "01/06/2024".into()),
                (4, 90.0.into()),
                (9, 0.12.into()),
                (10, 1_000_000.0.into()),
                (12, 0.0.into()),
            ],
        )],
    );
    let result = extract_commercial_paper(&ws, "BNK", 10);
    let record = &result.of(ProductType::CommercialPaper)[0];
    assert_eq!(record.calculated_rate(), RateOutcome::Computed(12.0));
    assert_eq!(record.declared_rate(), None);
}

#[test]
fn test_spot_credit_extraction() {
    let ws = sheet(
        "Spot",
        26,
        vec![row(
            26,
            &[
                (2, "01/06/2024".into()),
                (12, 1_000.0.into()),
                (13, 12.0.into()),
                (22, 1_100.0.into()),
                (25, "10".into()),
            ],
        )],
    );
    let result = extract_spot_credits(&ws, "BNK", 10);
    match &result.of(ProductType::SpotCredit)[0] {
        ProductRecord::SpotCredit(s) => {
            assert_eq!(s.maturity, MaturityBucket::Short);
            assert_eq!(s.calculated_rate, RateOutcome::Computed(10.0));
            assert_eq!(s.declared_rate, Some(0.1));
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_amortizing_credit_degenerate_rate_is_unverified() {
    let ws = sheet(
        "CA",
        26,
        vec![row(
            26,
            &[
                (2, "01/06/2024".into()),
                (12, 1_000_000.0.into()),
                (13, 84.0.into()),
                (25, 0.1.into()),
            ],
        )],
    );
    let result = extract_amortizing_credits(&ws, "BNK", 10);
    let records = result.of(ProductType::AmortizingCredit);
    match &records[0] {
        ProductRecord::AmortizingCredit(c) => {
            assert_eq!(c.maturity, MaturityBucket::Long);
            assert!(c.calculated_rate.is_degenerate());
        }
        other => panic!("unexpected record {:?}", other),
    }

    let report = ConformityChecker::batch().check_all(records);
    assert_eq!(report.statistics.global.unverified, 1);
    assert_eq!(report.statistics.global.total, 0);
    assert_eq!(report.statistics.global.conformity_rate, 0.0);
}
