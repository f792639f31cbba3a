//! Worksheet classification by free-text name
//!
//! Institutions name their worksheets loosely ("Découverts Bancaires 2024",
//! "CA", "effets_commerce"). Each product type owns a list of known aliases;
//! a sheet name is scored against every alias and the best product wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::ProductType;

/// Score for a sheet name equal to an alias
pub const EXACT_MATCH_SCORE: u32 = 1000;
/// Score for an alias appearing as whole words in the name (or the reverse)
pub const WORD_MATCH_SCORE: u32 = 100;
/// Score for any other substring containment
pub const PARTIAL_MATCH_SCORE: u32 = 50;

/// Version of the bundled alias table
pub const ALIAS_TABLE_VERSION: &str = "2024.1";

/// Known worksheet names for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub product: ProductType,
    pub aliases: Vec<String>,
}

/// Product → aliases table; entry order breaks exact-match collisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    pub version: String,
    pub entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn aliases(&self, product: ProductType) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.product == product)
            .map(|e| e.aliases.as_slice())
            .unwrap_or(&[])
    }
}

fn entry(product: ProductType, aliases: &[&str]) -> AliasEntry {
    AliasEntry {
        product,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

impl Default for AliasTable {
    /// Sheet names used by the submission template
    fn default() -> Self {
        Self {
            version: ALIAS_TABLE_VERSION.to_string(),
            entries: vec![
                entry(
                    ProductType::AmortizingCredit,
                    &[
                        "credits amortissables",
                        "credit amortissable",
                        "crédits amortissables",
                        "crédit amortissable",
                        "credits_amortissables",
                        "credit_amortissable",
                        "ca",
                        "credits",
                        "credit",
                    ],
                ),
                entry(
                    ProductType::Overdraft,
                    &[
                        "découverts bancaires",
                        "decouvert bancaire",
                        "découverts",
                        "decouverts",
                        "découvert",
                        "decouvert",
                        "dec",
                    ],
                ),
                entry(
                    ProductType::Factoring,
                    &["affacturage commercial", "affacturages", "affacturage", "aff"],
                ),
                entry(
                    ProductType::Guarantee,
                    &[
                        "cautions bancaires",
                        "caution bancaire",
                        "cautions",
                        "caution",
                        "cau",
                    ],
                ),
                entry(
                    ProductType::CommercialPaper,
                    &[
                        "effets de commerce",
                        "effet de commerce",
                        "effets_commerce",
                        "effet_commerce",
                        "effets commerciaux",
                        "effet commercial",
                        "effets",
                        "effet",
                        "ec",
                    ],
                ),
                entry(
                    ProductType::SpotCredit,
                    &[
                        "spot",
                        "spots",
                        "spot_fx",
                        "spots_fx",
                        "spot-fx",
                        "spots-fx",
                        "spot fx",
                        "spots fx",
                        "cours spot",
                        "cours_spot",
                        "cours-spot",
                        "taux spot",
                        "taux_spot",
                        "taux-spot",
                        "valeur spot",
                        "valeur_spot",
                        "valeur-spot",
                        "prix spot",
                        "prix_spot",
                        "prix-spot",
                        "sp",
                    ],
                ),
            ],
        }
    }
}

/// Outcome of classifying one sheet name
#[derive(Debug, Clone, PartialEq)]
pub enum SheetMatch {
    Exact(ProductType),
    Scored { product: ProductType, score: u32 },
    /// Several products share the top score
    Ambiguous { candidates: Vec<ProductType>, score: u32 },
    Unrecognized,
}

impl SheetMatch {
    pub fn product(&self) -> Option<ProductType> {
        match self {
            SheetMatch::Exact(p) => Some(*p),
            SheetMatch::Scored { product, .. } => Some(*product),
            SheetMatch::Ambiguous { .. } | SheetMatch::Unrecognized => None,
        }
    }
}

/// True when `needle` occurs in `haystack` as whole words
fn contains_word(haystack: &str, needle: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(needle)))
        .map(|re| re.is_match(haystack))
        .unwrap_or(false)
}

/// Score one alias against an already lowercased sheet name
fn alias_score(name: &str, alias: &str) -> u32 {
    if name == alias {
        EXACT_MATCH_SCORE
    } else if name.contains(alias) || alias.contains(name) {
        if contains_word(name, alias) || contains_word(alias, name) {
            WORD_MATCH_SCORE
        } else {
            PARTIAL_MATCH_SCORE
        }
    } else {
        0
    }
}

/// Per-product scores for a sheet name, in table order
pub fn score_sheet(sheet_name: &str, table: &AliasTable) -> Vec<(ProductType, u32)> {
    let name = sheet_name.trim().to_lowercase();
    table
        .entries
        .iter()
        .map(|entry| {
            if name.is_empty() {
                return (entry.product, 0);
            }
            let score = entry
                .aliases
                .iter()
                .map(|alias| alias_score(&name, &alias.trim().to_lowercase()))
                .sum();
            (entry.product, score)
        })
        .collect()
}

/// Classify a sheet name, keeping the scoring detail
pub fn classify_sheet(sheet_name: &str, table: &AliasTable) -> SheetMatch {
    let name = sheet_name.trim().to_lowercase();
    if name.is_empty() {
        return SheetMatch::Unrecognized;
    }

    // An exact alias match wins regardless of partial scores elsewhere
    for entry in &table.entries {
        if entry
            .aliases
            .iter()
            .any(|alias| alias.trim().to_lowercase() == name)
        {
            return SheetMatch::Exact(entry.product);
        }
    }

    let scores = score_sheet(&name, table);
    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return SheetMatch::Unrecognized;
    }

    let candidates: Vec<ProductType> = scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(p, _)| *p)
        .collect();

    match candidates.as_slice() {
        [product] => SheetMatch::Scored {
            product: *product,
            score: best,
        },
        _ => SheetMatch::Ambiguous {
            candidates,
            score: best,
        },
    }
}

/// Product type for a sheet name, or `None` when unrecognized or ambiguous
pub fn classify(sheet_name: &str, table: &AliasTable) -> Option<ProductType> {
    classify_sheet(sheet_name, table).product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_case_insensitive() {
        let table = AliasTable::default();
        assert_eq!(
            classify_sheet("Affacturage", &table),
            SheetMatch::Exact(ProductType::Factoring)
        );
        assert_eq!(
            classify("  EFFETS DE COMMERCE ", &table),
            Some(ProductType::CommercialPaper)
        );
    }

    #[test]
    fn test_whole_word_match() {
        let table = AliasTable::default();
        assert_eq!(
            classify("Découverts Bancaires 2024", &table),
            Some(ProductType::Overdraft)
        );
        assert_eq!(
            classify("Cautions bancaires T1", &table),
            Some(ProductType::Guarantee)
        );
    }

    #[test]
    fn test_alias_score_levels() {
        assert_eq!(alias_score("spot", "spot"), EXACT_MATCH_SCORE);
        assert_eq!(alias_score("taux spot 2024", "taux spot"), WORD_MATCH_SCORE);
        assert_eq!(alias_score("spotlight", "spot"), PARTIAL_MATCH_SCORE);
        assert_eq!(alias_score("bilan", "spot"), 0);
    }

    #[test]
    fn test_name_inside_alias_counts_as_word_match() {
        assert_eq!(alias_score("credit", "credit amortissable"), WORD_MATCH_SCORE);
    }

    #[test]
    fn test_unrecognized() {
        let table = AliasTable::default();
        assert_eq!(classify_sheet("Synthèse", &table), SheetMatch::Unrecognized);
        assert_eq!(classify_sheet("   ", &table), SheetMatch::Unrecognized);
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let table = AliasTable {
            version: "test".to_string(),
            entries: vec![
                entry(ProductType::Overdraft, &["alpha"]),
                entry(ProductType::Factoring, &["beta"]),
            ],
        };
        match classify_sheet("alpha beta", &table) {
            SheetMatch::Ambiguous { candidates, score } => {
                assert_eq!(candidates, vec![ProductType::Overdraft, ProductType::Factoring]);
                assert_eq!(score, WORD_MATCH_SCORE);
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }
}
