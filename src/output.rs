//! CSV writers for every pipeline stage.
//!
//! Stage outputs either replay the source table with derived columns
//! appended (taxonomy and feature stages) or serialize typed rows
//! (weekly scores, wide dashboards).

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::dashboard::WideDashboard;
use crate::records::{CommentFeatures, PostFeatures, RawTable};
use crate::taxonomy::matcher::TaxMatch;
use crate::weekly::WeeklyScoreRow;

/// Writes the source table with extra derived columns appended on the
/// right. Source cells pass through untouched.
pub fn write_table_with_columns(
    path: &Path,
    table: &RawTable,
    extra_headers: &[String],
    extra_cells: &[Vec<String>],
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    let mut headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
    headers.extend(extra_headers.iter().map(String::as_str));
    writer.write_record(&headers)?;

    for (i, row) in table.rows.iter().enumerate() {
        let mut record: Vec<&str> = table
            .headers
            .iter()
            .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
            .collect();
        if let Some(extras) = extra_cells.get(i) {
            record.extend(extras.iter().map(String::as_str));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = table.len(), "Wrote stage CSV");
    Ok(())
}

/// Derived column block for the taxonomy stage:
/// `<prefix>_theme`, `<prefix>_category`, `<prefix>_subcategory`,
/// `<prefix>_tax_score`.
pub fn taxonomy_columns(prefix: &str, matches: &[TaxMatch]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        format!("{prefix}_theme"),
        format!("{prefix}_category"),
        format!("{prefix}_subcategory"),
        format!("{prefix}_tax_score"),
    ];
    let cells = matches
        .iter()
        .map(|m| {
            vec![
                m.theme.clone(),
                m.category.clone(),
                m.subcategory.clone(),
                format!("{:.2}", m.score),
            ]
        })
        .collect();
    (headers, cells)
}

/// Derived column block for the post feature stage.
pub fn post_feature_columns(features: &[PostFeatures]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "week_start".to_string(),
        "bank".to_string(),
        "weighted_engagement".to_string(),
        "exposure_denom_used".to_string(),
        "exposure".to_string(),
        "engagement_rate".to_string(),
        "engagement_rate_z".to_string(),
        "zER_norm".to_string(),
        "shares_per_1k_exposure".to_string(),
    ];
    let cells = features
        .iter()
        .map(|f| {
            vec![
                f.week_start.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                f.bank.clone(),
                format!("{:.2}", f.weighted_engagement),
                f.exposure_denom_used.clone(),
                f.exposure.map(|v| format!("{v:.2}")).unwrap_or_default(),
                f.engagement_rate.map(|v| format!("{v:.6}")).unwrap_or_default(),
                f.engagement_rate_z.map(|v| format!("{v:.6}")).unwrap_or_default(),
                format!("{:.4}", f.zer_norm),
                f.shares_per_1k_exposure.map(|v| format!("{v:.4}")).unwrap_or_default(),
            ]
        })
        .collect();
    (headers, cells)
}

/// Derived column block for the comment feature stage.
pub fn comment_feature_columns(features: &[CommentFeatures]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "week_start".to_string(),
        "bank".to_string(),
        "sentiment".to_string(),
        "is_question".to_string(),
        "is_complaint".to_string(),
        "is_feature_request".to_string(),
        "is_resolution".to_string(),
        "is_praise".to_string(),
        "is_confusion".to_string(),
        "severity".to_string(),
    ];
    let cells = features
        .iter()
        .map(|f| {
            vec![
                f.week_start.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                f.bank.clone(),
                format!("{:.4}", f.sentiment),
                (f.is_question as u8).to_string(),
                (f.is_complaint as u8).to_string(),
                (f.is_feature_request as u8).to_string(),
                (f.is_resolution as u8).to_string(),
                (f.is_praise as u8).to_string(),
                (f.is_confusion as u8).to_string(),
                f.severity.to_string(),
            ]
        })
        .collect();
    (headers, cells)
}

/// Serializes the long weekly score table. The header row is written
/// explicitly so an empty table still carries the schema.
pub fn write_weekly(path: &Path, rows: &[WeeklyScoreRow]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(WeeklyScoreRow::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Wrote weekly score CSV");
    Ok(())
}

/// Writes a pivoted wide dashboard with its dynamic header set.
pub fn write_wide(path: &Path, dashboard: &WideDashboard) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new().from_writer(file);
    writer.write_record(&dashboard.headers)?;
    for row in &dashboard.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = dashboard.rows.len(), "Wrote wide dashboard CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("bes_pes_rater_{}_{}", std::process::id(), name))
    }

    fn small_table() -> RawTable {
        RawTable {
            headers: vec!["id".to_string(), "post_caption".to_string()],
            rows: vec![
                HashMap::from([
                    ("id".to_string(), "1".to_string()),
                    ("post_caption".to_string(), "need a loan".to_string()),
                ]),
                HashMap::from([
                    ("id".to_string(), "2".to_string()),
                    ("post_caption".to_string(), String::new()),
                ]),
            ],
        }
    }

    #[test]
    fn test_write_table_appends_derived_columns() {
        let path = temp_path("tax_stage.csv");
        let matches = vec![
            TaxMatch {
                theme: "Products".to_string(),
                category: "Loans".to_string(),
                subcategory: "Personal Loan".to_string(),
                score: 3.5,
            },
            TaxMatch::uncategorized(0.0),
        ];
        let (headers, cells) = taxonomy_columns("post", &matches);
        write_table_with_columns(&path, &small_table(), &headers, &cells).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,post_caption"));
        assert!(header.ends_with("post_theme,post_category,post_subcategory,post_tax_score"));
        assert!(lines.next().unwrap().contains("Personal Loan"));
        assert!(lines.next().unwrap().contains("Uncategorized"));

        fs::remove_file(&path).unwrap();
    }

    fn weekly_row() -> WeeklyScoreRow {
        WeeklyScoreRow {
            week_start: chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            bank: "Prime Bank".to_string(),
            taxonomy_level: "subcategory".to_string(),
            tax_value: "Personal Loan".to_string(),
            posts: 1,
            comments: 2,
            exposure: 1000.0,
            weighted_engagement: 40.0,
            zer_norm: 50.0,
            shares: 3.0,
            shares_per_1k_exposure: Some(3.0),
            reactions: 10.0,
            post_comments: 4.0,
            sentiment_mean: 0.2,
            sentiment_sum: 0.4,
            questions: 1,
            confusions: 0,
            complaints: 1,
            feature_requests: 0,
            resolutions: 0,
            praises: 1,
            severity_sum: 3.0,
            severity_mean: 1.5,
            bss_norm: 60.0,
            advocacy_raw: 3.0,
            advocacy_norm: 50.0,
            engagement_component: 50.0,
            helpfulness_component: 50.0,
            confusion_rate: 0.0,
            confusion_norm: 50.0,
            issue_rate_raw: Some(1.0),
            issue_rate_norm: 50.0,
            swi_raw: Some(3.0),
            swi_norm: 50.0,
            resolution_rate: 0.0,
            resolution_norm: 50.0,
            praise_rate: 0.5,
            praise_norm: 50.0,
            bes: 55.0,
            pes: 45.0,
        }
    }

    #[test]
    fn test_write_weekly_empty_table_keeps_header() {
        let path = temp_path("weekly_empty.csv");
        write_weekly(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(content.lines().next().unwrap(), WeeklyScoreRow::COLUMNS.join(","));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_weekly_header_matches_row_width() {
        let path = temp_path("weekly_one.csv");
        write_weekly(&path, &[weekly_row()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        assert_eq!(header.split(',').count(), WeeklyScoreRow::COLUMNS.len());
        assert_eq!(row.split(',').count(), WeeklyScoreRow::COLUMNS.len());
        assert!(row.starts_with("2024-03-04,Prime Bank,subcategory,Personal Loan"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_wide_headers_once() {
        let path = temp_path("wide.csv");
        let dash = WideDashboard {
            headers: vec!["week_start".to_string(), "bank".to_string()],
            rows: vec![vec!["2024-03-04".to_string(), "Prime Bank".to_string()]],
        };
        write_wide(&path, &dash).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }
}
