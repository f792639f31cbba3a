//! Calculated vs declared rate conformity
//!
//! Declared rates are stored as fractions (`0.125`), calculated rates as
//! percentages (`12.5`). Comparison happens on the fractional scale.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{ProductRecord, ProductType, RecordOrigin};

/// Tolerance of the batch import verification (0.1 percentage point)
pub const BATCH_TOLERANCE: f64 = 0.001;

/// Tolerance of the simplified bulk verification (1 percentage point).
///
/// Looser than [`BATCH_TOLERANCE`] for what is nominally the same check;
/// both are kept until the product owner settles on one.
pub const SIMPLIFIED_TOLERANCE: f64 = 0.01;

/// Which verification path produced the statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Both-zero records count as conformant
    Batch,
    /// Both-zero records are left out of the counts
    Simplified,
}

/// Symmetric comparison of two fractional rates
pub fn rates_conform(a: f64, b: f64, tolerance: f64) -> bool {
    if a == 0.0 && b == 0.0 {
        return true;
    }
    (a - b).abs() <= tolerance
}

/// Outcome of checking one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformityVerdict {
    pub conformant: bool,
    /// Calculated rate, percentage
    pub calculated_rate: f64,
    /// Declared rate, fraction
    pub declared_rate: f64,
    /// `|calculated / 100 − declared|`
    pub difference: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ConformityChecker {
    tolerance: f64,
    mode: VerificationMode,
}

impl ConformityChecker {
    pub fn new(tolerance: f64, mode: VerificationMode) -> Self {
        Self { tolerance, mode }
    }

    pub fn batch() -> Self {
        Self::new(BATCH_TOLERANCE, VerificationMode::Batch)
    }

    pub fn simplified() -> Self {
        Self::new(SIMPLIFIED_TOLERANCE, VerificationMode::Simplified)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// Compare a calculated percentage with a declared fraction
    pub fn verify(&self, calculated_pct: f64, declared_fraction: f64) -> ConformityVerdict {
        let calculated = calculated_pct / 100.0;
        ConformityVerdict {
            conformant: rates_conform(calculated, declared_fraction, self.tolerance),
            calculated_rate: calculated_pct,
            declared_rate: declared_fraction,
            difference: (calculated - declared_fraction).abs(),
        }
    }

    /// Verdict for a record, `None` when there is nothing meaningful to compare
    pub fn verify_record(&self, record: &ProductRecord) -> Option<ConformityVerdict> {
        if self.skips_zero_pair(record) {
            return None;
        }
        let calculated = record.calculated_rate().computed()?;
        let declared = record.declared_rate()?;
        Some(self.verify(calculated, declared))
    }

    /// Simplified mode leaves out records whose rates are both zero
    fn skips_zero_pair(&self, record: &ProductRecord) -> bool {
        self.mode == VerificationMode::Simplified
            && record.calculated_rate().computed() == Some(0.0)
            && record.declared_rate() == Some(0.0)
    }

    /// Check every record and aggregate the counts
    pub fn check_all<'a, I>(&self, records: I) -> ConformityReport
    where
        I: IntoIterator<Item = &'a ProductRecord>,
    {
        let mut checks = Vec::new();
        let mut statistics = ConformityStatistics::default();

        for record in records {
            let verdict = self.verify_record(record);
            if self.skips_zero_pair(record) {
                statistics.skip_zero_pair(record.product());
            } else {
                statistics.record(record.product(), verdict.as_ref());
            }
            checks.push(RecordCheck {
                product: record.product(),
                origin: record.origin().clone(),
                verdict,
            });
        }
        statistics.finish();

        ConformityReport {
            mode: self.mode,
            tolerance: self.tolerance,
            checks,
            statistics,
        }
    }
}

impl Default for ConformityChecker {
    fn default() -> Self {
        Self::batch()
    }
}

/// Counts for one product type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProductCounts {
    pub conformant: usize,
    pub non_conformant: usize,
    /// Records with a verdict
    pub total: usize,
    /// Records without a verdict (degenerate calculation or no declared rate)
    pub unverified: usize,
    /// Zero calculated and zero declared rate, left out in simplified mode
    pub skipped_zero: usize,
}

/// Workbook-wide aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GlobalCounts {
    pub conformant: usize,
    pub non_conformant: usize,
    pub total: usize,
    pub unverified: usize,
    pub skipped_zero: usize,
    /// Conformant share of verified records, percentage rounded to 2 decimals
    pub conformity_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConformityStatistics {
    pub by_product: BTreeMap<ProductType, ProductCounts>,
    pub global: GlobalCounts,
}

impl ConformityStatistics {
    fn record(&mut self, product: ProductType, verdict: Option<&ConformityVerdict>) {
        let counts = self.by_product.entry(product).or_default();
        match verdict {
            Some(v) => {
                counts.total += 1;
                if v.conformant {
                    counts.conformant += 1;
                } else {
                    counts.non_conformant += 1;
                }
            }
            None => counts.unverified += 1,
        }
    }

    fn skip_zero_pair(&mut self, product: ProductType) {
        self.by_product.entry(product).or_default().skipped_zero += 1;
    }

    fn finish(&mut self) {
        let mut global = GlobalCounts::default();
        for counts in self.by_product.values() {
            global.conformant += counts.conformant;
            global.non_conformant += counts.non_conformant;
            global.total += counts.total;
            global.unverified += counts.unverified;
            global.skipped_zero += counts.skipped_zero;
        }
        global.conformity_rate = if global.total > 0 {
            (global.conformant as f64 / global.total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };
        self.global = global;
    }

    pub fn product(&self, product: ProductType) -> ProductCounts {
        self.by_product.get(&product).copied().unwrap_or_default()
    }
}

/// One record's verification result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordCheck {
    pub product: ProductType,
    pub origin: RecordOrigin,
    pub verdict: Option<ConformityVerdict>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConformityReport {
    pub mode: VerificationMode,
    pub tolerance: f64,
    pub checks: Vec<RecordCheck>,
    pub statistics: ConformityStatistics,
}

impl ConformityReport {
    pub fn non_conformant(&self) -> impl Iterator<Item = &RecordCheck> {
        self.checks
            .iter()
            .filter(|c| matches!(&c.verdict, Some(v) if !v.conformant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_scales_calculated_rate() {
        let verdict = ConformityChecker::batch().verify(8.45, 0.085);
        assert!(verdict.conformant);
        assert!((verdict.difference - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_verify_outside_tolerance() {
        let verdict = ConformityChecker::batch().verify(9.0, 0.085);
        assert!(!verdict.conformant);
        assert!(ConformityChecker::simplified().verify(9.0, 0.085).conformant);
    }

    #[test]
    fn test_both_zero_is_conformant() {
        assert!(rates_conform(0.0, 0.0, BATCH_TOLERANCE));
        assert!(ConformityChecker::batch().verify(0.0, 0.0).conformant);
    }

    #[test]
    fn test_rates_conform_is_symmetric() {
        let pairs = [(0.0845, 0.085), (0.2, 0.1), (0.0, 0.0009), (0.0, 0.002)];
        for (a, b) in pairs {
            assert_eq!(
                rates_conform(a, b, BATCH_TOLERANCE),
                rates_conform(b, a, BATCH_TOLERANCE)
            );
        }
    }

    #[test]
    fn test_default_is_batch() {
        let checker = ConformityChecker::default();
        assert_eq!(checker.mode(), VerificationMode::Batch);
        assert_eq!(checker.tolerance(), BATCH_TOLERANCE);
    }
}
