//! Taxonomy loading and rule-based matching.
//!
//! A taxonomy document maps themes to categories to subcategories. Each
//! leaf is flattened into a [`Taxon`] carrying the expanded set of match
//! phrases used by the scorer in [`matcher`].

pub mod expand;
pub mod matcher;

use crate::taxonomy::expand::expand_phrases;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One (theme, category, subcategory) leaf with its normalized match
/// phrases, ordered longest-first. Built once at startup, read-only after.
#[derive(Debug, Clone)]
pub struct Taxon {
    pub theme: String,
    pub category: String,
    pub subcategory: String,
    pub phrases: Vec<String>,
}

/// Label applied to records that score below the match threshold.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Deserialize)]
struct TaxonomyDoc {
    taxonomy: TaxonomyBody,
}

#[derive(Deserialize)]
struct TaxonomyBody {
    themes: Vec<ThemeDoc>,
}

#[derive(Deserialize)]
struct ThemeDoc {
    name: String,
    categories: Vec<CategoryDoc>,
}

#[derive(Deserialize)]
struct CategoryDoc {
    name: String,
    #[serde(rename = "subCategories")]
    sub_categories: Vec<String>,
}

/// Loads a taxonomy JSON document and flattens it into taxons.
///
/// Phrases for a leaf are the expansions of the subcategory, category, and
/// theme names, in that order, so subcategory-specific phrases are tried
/// first by the matcher.
pub fn load_taxonomy(path: &Path) -> Result<Vec<Taxon>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading taxonomy file {}", path.display()))?;
    let doc: TaxonomyDoc = serde_json::from_str(&raw)
        .with_context(|| format!("parsing taxonomy JSON {}", path.display()))?;
    Ok(flatten(doc))
}

/// Parses a taxonomy document from an in-memory JSON string.
pub fn parse_taxonomy(json: &str) -> Result<Vec<Taxon>> {
    let doc: TaxonomyDoc = serde_json::from_str(json).context("parsing taxonomy JSON")?;
    Ok(flatten(doc))
}

fn flatten(doc: TaxonomyDoc) -> Vec<Taxon> {
    let mut taxons = Vec::new();
    for theme in &doc.taxonomy.themes {
        for cat in &theme.categories {
            for sub in &cat.sub_categories {
                let mut phrases = expand_phrases(sub);
                phrases.extend(expand_phrases(&cat.name));
                phrases.extend(expand_phrases(&theme.name));
                // expansions of the three levels overlap; keep first occurrence
                let mut seen = std::collections::HashSet::new();
                phrases.retain(|p| seen.insert(p.clone()));
                taxons.push(Taxon {
                    theme: theme.name.clone(),
                    category: cat.name.clone(),
                    subcategory: sub.clone(),
                    phrases,
                });
            }
        }
    }
    taxons
}

/// The taxonomy depth at which weekly scores are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyLevel {
    Theme,
    Category,
    Subcategory,
}

impl TaxonomyLevel {
    pub const ALL: [TaxonomyLevel; 3] = [
        TaxonomyLevel::Theme,
        TaxonomyLevel::Category,
        TaxonomyLevel::Subcategory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyLevel::Theme => "theme",
            TaxonomyLevel::Category => "category",
            TaxonomyLevel::Subcategory => "subcategory",
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "theme" => Ok(TaxonomyLevel::Theme),
            "category" => Ok(TaxonomyLevel::Category),
            "subcategory" => Ok(TaxonomyLevel::Subcategory),
            other => anyhow::bail!(
                "invalid taxonomy level {other:?}; expected theme, category, or subcategory"
            ),
        }
    }
}
