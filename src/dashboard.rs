//! Wide dashboard pivot: one row per (week, bank), one BES and one PES
//! column per taxonomy value, plus aggregate volume columns.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::stats::mean;
use crate::taxonomy::TaxonomyLevel;
use crate::text::slugify;
use crate::weekly::WeeklyScoreRow;

/// Volume columns repeated on every dashboard row, in output order.
const VOLUME_COLUMNS: &[&str] = &["posts", "comments", "exposure", "shares", "weighted_engagement"];

/// A pivoted dashboard table with a dynamic column set.
#[derive(Debug, Clone)]
pub struct WideDashboard {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Default)]
struct WideAcc {
    posts: u64,
    comments: u64,
    exposure: f64,
    shares: f64,
    weighted_engagement: f64,
    // metric column -> observed values (averaged if a slice repeats)
    metrics: BTreeMap<String, Vec<f64>>,
}

/// Pivots the long weekly table into the wide dashboard shape.
///
/// Metric columns are named `BES__<level>__<slug>` / `PES__<level>__<slug>`
/// and ordered lexicographically after the key and volume columns. Cells
/// for taxonomy values absent in a given week stay empty.
pub fn make_wide_dashboard(weekly: &[WeeklyScoreRow], level: TaxonomyLevel) -> WideDashboard {
    let mut cells: BTreeMap<(NaiveDate, String), WideAcc> = BTreeMap::new();
    let mut metric_columns: BTreeSet<String> = BTreeSet::new();

    for row in weekly {
        let slug = slugify(&row.tax_value);
        let bes_col = format!("BES__{}__{}", level, slug);
        let pes_col = format!("PES__{}__{}", level, slug);
        metric_columns.insert(bes_col.clone());
        metric_columns.insert(pes_col.clone());

        let acc = cells.entry((row.week_start, row.bank.clone())).or_default();
        acc.posts += row.posts;
        acc.comments += row.comments;
        acc.exposure += row.exposure;
        acc.shares += row.shares;
        acc.weighted_engagement += row.weighted_engagement;
        acc.metrics.entry(bes_col).or_default().push(row.bes);
        acc.metrics.entry(pes_col).or_default().push(row.pes);
    }

    let mut headers: Vec<String> = vec!["week_start".to_string(), "bank".to_string()];
    headers.extend(VOLUME_COLUMNS.iter().map(|c| c.to_string()));
    headers.extend(metric_columns.iter().cloned());

    let mut rows = Vec::with_capacity(cells.len());
    for ((week, bank), acc) in cells {
        let mut row = vec![
            week.format("%Y-%m-%d").to_string(),
            bank,
            acc.posts.to_string(),
            acc.comments.to_string(),
            format_num(acc.exposure),
            format_num(acc.shares),
            format_num(acc.weighted_engagement),
        ];
        for col in &metric_columns {
            match acc.metrics.get(col) {
                Some(values) => row.push(format_num(mean(values))),
                None => row.push(String::new()),
            }
        }
        rows.push(row);
    }

    WideDashboard { headers, rows }
}

fn format_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_row(week: (i32, u32, u32), bank: &str, tax: &str, bes: f64, pes: f64) -> WeeklyScoreRow {
        WeeklyScoreRow {
            week_start: NaiveDate::from_ymd_opt(week.0, week.1, week.2).unwrap(),
            bank: bank.to_string(),
            taxonomy_level: "subcategory".to_string(),
            tax_value: tax.to_string(),
            posts: 2,
            comments: 3,
            exposure: 100.0,
            weighted_engagement: 40.0,
            zer_norm: 50.0,
            shares: 4.0,
            shares_per_1k_exposure: None,
            reactions: 10.0,
            post_comments: 5.0,
            sentiment_mean: 0.0,
            sentiment_sum: 0.0,
            questions: 0,
            confusions: 0,
            complaints: 0,
            feature_requests: 0,
            resolutions: 0,
            praises: 0,
            severity_sum: 0.0,
            severity_mean: 0.0,
            bss_norm: 50.0,
            advocacy_raw: 0.0,
            advocacy_norm: 50.0,
            engagement_component: 50.0,
            helpfulness_component: 50.0,
            confusion_rate: 0.0,
            confusion_norm: 50.0,
            issue_rate_raw: None,
            issue_rate_norm: 50.0,
            swi_raw: None,
            swi_norm: 50.0,
            resolution_rate: 0.0,
            resolution_norm: 50.0,
            praise_rate: 0.0,
            praise_norm: 50.0,
            bes,
            pes,
        }
    }

    #[test]
    fn test_one_row_per_week_bank() {
        let weekly = vec![
            weekly_row((2024, 3, 4), "Prime Bank", "Personal Loan", 60.0, 70.0),
            weekly_row((2024, 3, 4), "Prime Bank", "Home Loan", 40.0, 30.0),
            weekly_row((2024, 3, 4), "City Bank", "Personal Loan", 55.0, 45.0),
        ];
        let wide = make_wide_dashboard(&weekly, TaxonomyLevel::Subcategory);
        assert_eq!(wide.rows.len(), 2);
    }

    #[test]
    fn test_metric_columns_are_slugged_and_sorted() {
        let weekly = vec![
            weekly_row((2024, 3, 4), "Prime Bank", "Personal Loan", 60.0, 70.0),
            weekly_row((2024, 3, 4), "Prime Bank", "Home Loan", 40.0, 30.0),
        ];
        let wide = make_wide_dashboard(&weekly, TaxonomyLevel::Subcategory);
        assert!(wide.headers.contains(&"BES__subcategory__personal_loan".to_string()));
        assert!(wide.headers.contains(&"PES__subcategory__home_loan".to_string()));

        let metric_headers: Vec<_> =
            wide.headers.iter().filter(|h| h.contains("__")).cloned().collect();
        let mut sorted = metric_headers.clone();
        sorted.sort();
        assert_eq!(metric_headers, sorted);
    }

    #[test]
    fn test_volumes_sum_across_tax_values() {
        let weekly = vec![
            weekly_row((2024, 3, 4), "Prime Bank", "Personal Loan", 60.0, 70.0),
            weekly_row((2024, 3, 4), "Prime Bank", "Home Loan", 40.0, 30.0),
        ];
        let wide = make_wide_dashboard(&weekly, TaxonomyLevel::Subcategory);
        let row = &wide.rows[0];
        // posts column right after week_start and bank
        assert_eq!(row[2], "4");
        assert_eq!(row[3], "6");
    }

    #[test]
    fn test_missing_slice_leaves_empty_cell() {
        let weekly = vec![
            weekly_row((2024, 3, 4), "Prime Bank", "Personal Loan", 60.0, 70.0),
            weekly_row((2024, 3, 11), "Prime Bank", "Home Loan", 40.0, 30.0),
        ];
        let wide = make_wide_dashboard(&weekly, TaxonomyLevel::Subcategory);
        let home_col = wide
            .headers
            .iter()
            .position(|h| h == "BES__subcategory__home_loan")
            .unwrap();
        // first week has no Home Loan slice
        assert_eq!(wide.rows[0][home_col], "");
        assert_ne!(wide.rows[1][home_col], "");
    }
}
