//! Feature engineering over raw post and comment tables: week bucketing,
//! bank standardization, taxonomy application, engagement and
//! sentiment/intent features.

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::records::{CommentFeatures, PostFeatures, RawTable, TaxLabels};
use crate::sentiment::SentimentScorer;
use crate::sentiment::intent::{
    estimate_severity, is_complaint, is_feature_request, is_praise, is_question, is_resolution,
};
use crate::stats::{mean, stddev, z_to_unit_interval};
use crate::taxonomy::Taxon;
use crate::taxonomy::matcher::{TaxMatch, best_taxonomy_match};
use crate::text::normalize_text;

/// Timestamp columns accepted for posts, in priority order.
pub const POST_TIME_CANDIDATES: &[&str] =
    &["post_creation_time", "post_facebook_creation_time", "post_created_at"];

/// Timestamp columns accepted for comments, in priority order.
pub const COMMENT_TIME_CANDIDATES: &[&str] =
    &["comment_commented_at", "comment_created_at", "comment_updated_at"];

pub const POST_BANK_CANDIDATES: &[&str] = &["page_name", "post_tagged_bank", "post_tagged_banks"];

pub const COMMENT_BANK_CANDIDATES: &[&str] =
    &["page_name", "comment_tagged_bank", "comment_comment_tagged_banks", "post_tagged_bank"];

pub const POST_CAPTION_COLUMN: &str = "post_caption";
pub const COMMENT_TEXT_COLUMN: &str = "comment_comment_text";

/// Canonical bank names with the patterns that identify them in page
/// names and tags.
static BANK_PATTERNS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    let pats = |ps: &[&str]| ps.iter().map(|p| Regex::new(p).unwrap()).collect::<Vec<_>>();
    vec![
        ("Prime Bank", pats(&[r"\bprime\b", r"prime bank", r"primebank"])),
        ("BRAC Bank", pats(&[r"\bbrac\b", r"brac bank"])),
        ("Dutch-Bangla Bank", pats(&[r"dutch", r"dbbl", r"dutch bangla", r"dutch-bangla"])),
        ("Eastern Bank", pats(&[r"\bebl\b", r"eastern bank"])),
        ("City Bank", pats(&[r"\bcity\b", r"city bank"])),
    ]
});

/// Maps a raw page name or tag to a canonical bank name. Unrecognized
/// non-empty values pass through trimmed; everything else is `"Unknown"`.
pub fn standardize_bank(name: Option<&str>) -> String {
    let t = normalize_text(name.unwrap_or(""));
    for (canon, patterns) in BANK_PATTERNS.iter() {
        if patterns.iter().any(|p| p.is_match(&t)) {
            return (*canon).to_string();
        }
    }
    let fallback = name.unwrap_or("").trim();
    if fallback.is_empty() { "Unknown".to_string() } else { fallback.to_string() }
}

/// Parses an export timestamp (RFC 3339, naive datetime, or bare date)
/// down to its calendar date. Unparseable values yield `None`.
pub fn parse_timestamp_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Matches every row of a table against the taxonomy, concatenating the
/// given text columns per row. One [`TaxMatch`] per row, in row order.
pub fn apply_taxonomy(
    table: &RawTable,
    text_columns: &[&str],
    taxons: &[Taxon],
    min_score: f64,
) -> Vec<TaxMatch> {
    (0..table.len())
        .map(|i| {
            let text = text_columns
                .iter()
                .filter_map(|c| table.value(i, c))
                .collect::<Vec<_>>()
                .join(" ");
            best_taxonomy_match(&text, taxons, min_score)
        })
        .collect()
}

/// Builds engagement features for every post row.
///
/// Fatal when no timestamp column from [`POST_TIME_CANDIDATES`] exists.
/// Rows with unparseable timestamps keep their features but carry no week
/// bucket, which excludes them from weekly aggregation.
pub fn build_post_features(table: &RawTable, labels: &[TaxMatch]) -> Result<Vec<PostFeatures>> {
    let Some(time_col) = table.first_column(POST_TIME_CANDIDATES) else {
        bail!(
            "no usable post timestamp column found (expected one of {})",
            POST_TIME_CANDIDATES.join(", ")
        );
    };
    let bank_col = table.first_column(POST_BANK_CANDIDATES);
    if bank_col.is_none() {
        warn!("no bank column found in posts; using \"Unknown\"");
    }

    // Exposure denominator priority: impressions -> reach -> engagement proxy.
    let impression_col = table.column_containing("impression");
    let reach_col = table.column_containing("reach");
    debug!(?impression_col, ?reach_col, "Exposure denominator candidates");

    let mut features: Vec<PostFeatures> = Vec::with_capacity(table.len());
    for i in 0..table.len() {
        let reactions = table.number(i, "post_reactions_total").unwrap_or(0.0);
        let comment_count = table.number(i, "post_total_comment_count").unwrap_or(0.0);
        let shares = table.number(i, "post_share_count").unwrap_or(0.0);
        let weighted_engagement = 1.0 * reactions + 3.0 * comment_count + 5.0 * shares;

        let (denom, denom_used) = if let Some(col) = &impression_col {
            (table.number(i, col), col.clone())
        } else if let Some(col) = &reach_col {
            (table.number(i, col), col.clone())
        } else {
            (Some(reactions + comment_count + shares), "engagement_proxy".to_string())
        };
        let exposure = denom.filter(|d| *d > 0.0);

        let engagement_rate = exposure.map(|e| weighted_engagement / e);
        let shares_per_1k_exposure =
            exposure.map(|e| shares / (e / 1000.0)).filter(|v| v.is_finite());

        let week = table
            .value(i, &time_col)
            .and_then(parse_timestamp_date)
            .map(week_start);

        let bank = standardize_bank(bank_col.as_deref().and_then(|c| table.value(i, c)));

        features.push(PostFeatures {
            week_start: week,
            bank,
            labels: TaxLabels::from(labels[i].clone()),
            reactions,
            comment_count,
            shares,
            weighted_engagement,
            exposure_denom_used: denom_used,
            exposure,
            engagement_rate,
            engagement_rate_z: None,
            zer_norm: 50.0,
            shares_per_1k_exposure,
        });
    }

    attach_engagement_z_scores(&mut features);
    Ok(features)
}

/// Per-bank z-score of the engagement rate, mapped to 0–100 via the
/// normal CDF. Banks with zero variance fall back to a std of 1.0; posts
/// without a rate stay at the neutral 50.
fn attach_engagement_z_scores(features: &mut [PostFeatures]) {
    let mut by_bank: HashMap<String, Vec<f64>> = HashMap::new();
    for f in features.iter() {
        if let Some(rate) = f.engagement_rate {
            by_bank.entry(f.bank.clone()).or_default().push(rate);
        }
    }

    let moments: HashMap<String, (f64, f64)> = by_bank
        .into_iter()
        .map(|(bank, rates)| {
            let m = mean(&rates);
            let sd = stddev(&rates, m);
            (bank, (m, if sd > 0.0 { sd } else { 1.0 }))
        })
        .collect();

    for f in features.iter_mut() {
        if let (Some(rate), Some((m, sd))) = (f.engagement_rate, moments.get(&f.bank)) {
            let z = (rate - m) / sd;
            f.engagement_rate_z = Some(z);
            f.zer_norm = z_to_unit_interval(z);
        }
    }
}

/// Builds sentiment and intent features for every comment row.
///
/// Fatal when no timestamp column from [`COMMENT_TIME_CANDIDATES`]
/// exists. Sentiment is scored in batches through the configured backend.
pub async fn build_comment_features(
    table: &RawTable,
    labels: &[TaxMatch],
    scorer: &SentimentScorer,
) -> Result<Vec<CommentFeatures>> {
    let Some(time_col) = table.first_column(COMMENT_TIME_CANDIDATES) else {
        bail!(
            "no usable comment timestamp column found (expected one of {})",
            COMMENT_TIME_CANDIDATES.join(", ")
        );
    };
    let bank_col = table.first_column(COMMENT_BANK_CANDIDATES);
    if bank_col.is_none() {
        warn!("no bank column found in comments; using \"Unknown\"");
    }
    if !table.has_column(COMMENT_TEXT_COLUMN) {
        warn!(column = COMMENT_TEXT_COLUMN, "comment text column missing; treating as empty");
    }

    let texts: Vec<String> = (0..table.len())
        .map(|i| table.value(i, COMMENT_TEXT_COLUMN).unwrap_or("").to_string())
        .collect();
    let sentiments = scorer.score_texts(&texts).await;

    let lex = scorer.lexicons();
    let mut features = Vec::with_capacity(table.len());
    for (i, text) in texts.iter().enumerate() {
        let sentiment = sentiments[i];
        let question = is_question(text, lex);
        let complaint = is_complaint(text, lex);

        let week = table
            .value(i, &time_col)
            .and_then(parse_timestamp_date)
            .map(week_start);
        let bank = standardize_bank(bank_col.as_deref().and_then(|c| table.value(i, c)));

        features.push(CommentFeatures {
            week_start: week,
            bank,
            labels: TaxLabels::from(labels[i].clone()),
            sentiment,
            is_question: question,
            is_complaint: complaint,
            is_feature_request: is_feature_request(text, lex),
            is_resolution: is_resolution(text, lex),
            is_praise: is_praise(text, lex),
            is_confusion: question && sentiment <= 0.1,
            severity: if complaint { estimate_severity(text, lex) } else { 0 },
        });
    }

    Ok(features)
}
