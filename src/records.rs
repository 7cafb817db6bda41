//! Tabular input model and derived per-record features.
//!
//! Input CSVs are denormalized exports with no fixed schema, so rows are
//! kept as string field maps behind an ordered header list. Derived
//! columns live in typed side records; source columns are never mutated.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::taxonomy::matcher::TaxMatch;

/// An input CSV held in memory: ordered headers plus one field map per
/// row. Empty cells are treated as missing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    /// Reads a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut rdr = csv::Reader::from_reader(file);

        let headers: Vec<String> =
            rdr.headers().context("reading CSV headers")?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.with_context(|| format!("reading row of {}", path.display()))?;
            let mut row = HashMap::with_capacity(headers.len());
            for (h, v) in headers.iter().zip(record.iter()) {
                row.insert(h.clone(), v.to_string());
            }
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// First header from `candidates` that exists in this table.
    pub fn first_column(&self, candidates: &[&str]) -> Option<String> {
        candidates.iter().find(|c| self.has_column(c)).map(|c| c.to_string())
    }

    /// First header whose lowercased name contains `needle`.
    pub fn column_containing(&self, needle: &str) -> Option<String> {
        self.headers.iter().find(|h| h.to_lowercase().contains(needle)).cloned()
    }

    /// A cell value; empty strings count as missing.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// A cell parsed as f64; missing or unparseable cells become `None`.
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column).and_then(|v| v.trim().parse::<f64>().ok())
    }
}

/// The taxonomy labels attached to a record.
#[derive(Debug, Clone)]
pub struct TaxLabels {
    pub theme: String,
    pub category: String,
    pub subcategory: String,
    pub score: f64,
}

impl From<TaxMatch> for TaxLabels {
    fn from(m: TaxMatch) -> Self {
        TaxLabels {
            theme: m.theme,
            category: m.category,
            subcategory: m.subcategory,
            score: m.score,
        }
    }
}

/// Derived metrics for one post row. Indexes match the source table rows.
#[derive(Debug, Clone)]
pub struct PostFeatures {
    pub week_start: Option<NaiveDate>,
    pub bank: String,
    pub labels: TaxLabels,
    pub reactions: f64,
    pub comment_count: f64,
    pub shares: f64,
    pub weighted_engagement: f64,
    pub exposure_denom_used: String,
    pub exposure: Option<f64>,
    pub engagement_rate: Option<f64>,
    pub engagement_rate_z: Option<f64>,
    /// z-score mapped to 0–100 by the normal CDF; 50 when the rate is missing.
    pub zer_norm: f64,
    pub shares_per_1k_exposure: Option<f64>,
}

/// Derived metrics for one comment row.
#[derive(Debug, Clone)]
pub struct CommentFeatures {
    pub week_start: Option<NaiveDate>,
    pub bank: String,
    pub labels: TaxLabels,
    pub sentiment: f64,
    pub is_question: bool,
    pub is_complaint: bool,
    pub is_feature_request: bool,
    pub is_resolution: bool,
    pub is_praise: bool,
    /// Question with sentiment <= 0.1.
    pub is_confusion: bool,
    /// 1–5 for complaints, 0 otherwise.
    pub severity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table_from(csv_text: &str) -> RawTable {
        let path = std::env::temp_dir().join(format!(
            "bes_pes_rater_records_{}_{}.csv",
            std::process::id(),
            csv_text.len()
        ));
        let mut f = File::create(&path).unwrap();
        f.write_all(csv_text.as_bytes()).unwrap();
        let t = RawTable::from_csv_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        t
    }

    #[test]
    fn test_read_table_preserves_headers_and_rows() {
        let t = table_from("a,b\n1,x\n2,\n");
        assert_eq!(t.headers, vec!["a", "b"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, "b"), Some("x"));
        assert_eq!(t.value(1, "b"), None); // empty cell is missing
    }

    #[test]
    fn test_first_column_priority() {
        let t = table_from("post_created_at,page_name\n2024-01-01,Prime\n");
        assert_eq!(
            t.first_column(&["post_creation_time", "post_created_at"]),
            Some("post_created_at".to_string())
        );
        assert_eq!(t.first_column(&["nope"]), None);
    }

    #[test]
    fn test_column_containing() {
        let t = table_from("post_Impressions_total,x\n10,1\n");
        assert_eq!(t.column_containing("impression"), Some("post_Impressions_total".to_string()));
        assert_eq!(t.column_containing("reach"), None);
    }

    #[test]
    fn test_number_parsing() {
        let t = table_from("n\n10.5\nabc\n\n");
        assert_eq!(t.number(0, "n"), Some(10.5));
        assert_eq!(t.number(1, "n"), None);
        assert_eq!(t.number(2, "n"), None);
    }
}
