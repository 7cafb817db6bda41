//! Phrase-scoring matcher that assigns each text to a taxonomy leaf.
//!
//! This is a transparent rule-based classifier: every taxon is scored by
//! the phrases it matches, longer phrases counting for more. A full scan
//! over all taxons is performed per document; there is no index.

use crate::taxonomy::{Taxon, TaxonomyLevel, UNCATEGORIZED};
use crate::text::{contains_bengali, normalize_text, word_boundary_contains};

/// Result of matching one text against the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxMatch {
    pub theme: String,
    pub category: String,
    pub subcategory: String,
    pub score: f64,
}

impl TaxMatch {
    /// The all-`Uncategorized` match carrying the given (sub-threshold) score.
    pub fn uncategorized(score: f64) -> Self {
        TaxMatch {
            theme: UNCATEGORIZED.to_string(),
            category: UNCATEGORIZED.to_string(),
            subcategory: UNCATEGORIZED.to_string(),
            score,
        }
    }

    pub fn label_at(&self, level: TaxonomyLevel) -> &str {
        match level {
            TaxonomyLevel::Theme => &self.theme,
            TaxonomyLevel::Category => &self.category,
            TaxonomyLevel::Subcategory => &self.subcategory,
        }
    }
}

/// Scores a single taxon against normalized text.
///
/// Each matched phrase contributes `clamp(len/6, 1, 6)`, so longer (more
/// specific) phrases dominate, and multiple matches add up. Matching the
/// literal subcategory name earns a +2.0 bonus.
fn score_taxon(normalized: &str, taxon: &Taxon) -> f64 {
    let mut score = 0.0;
    for phrase in &taxon.phrases {
        let hit = if contains_bengali(phrase) {
            normalized.contains(phrase.as_str())
        } else {
            // Latin phrases need a word boundary; longer phrases fall back
            // to substring so punctuation differences still match.
            word_boundary_contains(normalized, phrase)
                || (phrase.chars().count() >= 6 && normalized.contains(phrase.as_str()))
        };
        if hit {
            score += (phrase.chars().count() as f64 / 6.0).clamp(1.0, 6.0);
        }
    }

    let sub_norm = normalize_text(&taxon.subcategory);
    if !sub_norm.is_empty() && normalized.contains(&sub_norm) {
        score += 2.0;
    }

    score
}

/// Finds the best taxonomy match for a text.
///
/// Returns `Uncategorized` at all three levels when the text is empty or
/// the best score falls below `min_score`. Ties go to the first taxon in
/// document order.
pub fn best_taxonomy_match(text: &str, taxons: &[Taxon], min_score: f64) -> TaxMatch {
    let t = normalize_text(text);
    if t.is_empty() {
        return TaxMatch::uncategorized(0.0);
    }

    let mut best: Option<(&Taxon, f64)> = None;
    for taxon in taxons {
        let score = score_taxon(&t, taxon);
        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((taxon, score));
        }
    }

    match best {
        Some((taxon, score)) if score >= min_score => TaxMatch {
            theme: taxon.theme.clone(),
            category: taxon.category.clone(),
            subcategory: taxon.subcategory.clone(),
            score,
        },
        Some((_, score)) => TaxMatch::uncategorized(score),
        None => TaxMatch::uncategorized(0.0),
    }
}

/// Default minimum score below which a text stays uncategorized.
pub const DEFAULT_MIN_SCORE: f64 = 2.0;

#[cfg(test)]
mod tests {
    use super::*;

    fn loan_taxons() -> Vec<Taxon> {
        crate::taxonomy::parse_taxonomy(
            r#"{
                "taxonomy": {
                    "themes": [
                        {
                            "name": "Products",
                            "categories": [
                                {
                                    "name": "Loans",
                                    "subCategories": ["Personal Loan", "Home Loan"]
                                },
                                {
                                    "name": "Cards",
                                    "subCategories": ["Credit Card"]
                                }
                            ]
                        }
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_text_is_uncategorized_with_zero_score() {
        let m = best_taxonomy_match("", &loan_taxons(), DEFAULT_MIN_SCORE);
        assert_eq!(m, TaxMatch::uncategorized(0.0));
    }

    #[test]
    fn test_personal_loan_matches_subcategory() {
        let m = best_taxonomy_match("I need a personal loan", &loan_taxons(), DEFAULT_MIN_SCORE);
        assert_eq!(m.subcategory, "Personal Loan");
        assert!(m.score >= 2.0);
    }

    #[test]
    fn test_bengali_matches_by_substring() {
        let m = best_taxonomy_match("আমি ঋণ নিতে চাই", &loan_taxons(), DEFAULT_MIN_SCORE);
        assert_eq!(m.category, "Loans");
    }

    #[test]
    fn test_unrelated_text_stays_uncategorized() {
        let m = best_taxonomy_match("what a lovely sunset", &loan_taxons(), DEFAULT_MIN_SCORE);
        assert_eq!(m.theme, UNCATEGORIZED);
    }

    #[test]
    fn test_score_monotone_in_matched_phrases() {
        let taxons = loan_taxons();
        let one = best_taxonomy_match("credit card", &taxons, 0.1).score;
        let two = best_taxonomy_match("credit card visa", &taxons, 0.1).score;
        assert!(two >= one);
    }

    #[test]
    fn test_subcategory_literal_gets_bonus() {
        let taxons = loan_taxons();
        let without = best_taxonomy_match("need a loan", &taxons, 0.1).score;
        let with = best_taxonomy_match("need a home loan", &taxons, 0.1).score;
        assert!(with > without);
    }

    #[test]
    fn test_label_at_levels() {
        let m = best_taxonomy_match("credit card payment", &loan_taxons(), DEFAULT_MIN_SCORE);
        assert_eq!(m.label_at(TaxonomyLevel::Theme), "Products");
        assert_eq!(m.label_at(TaxonomyLevel::Category), "Cards");
        assert_eq!(m.label_at(TaxonomyLevel::Subcategory), "Credit Card");
    }
}
