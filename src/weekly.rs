//! Weekly aggregation and BES/PES score computation.
//!
//! Posts and comments are grouped independently by
//! `(week_start, bank, taxonomy value)` and outer-joined on that key, so a
//! slice with only comment activity (or only post activity) still gets a
//! row. Sub-scores are percentile-normalized within each
//! `(bank, taxonomy value)` group across weeks, then blended with fixed
//! weights into the two 0–100 composite scores.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::records::{CommentFeatures, PostFeatures};
use crate::stats::{mean, percentile_ranks};
use crate::taxonomy::TaxonomyLevel;

/// BES component weights: sentiment, advocacy, engagement, helpfulness,
/// inverse confusion.
const BES_WEIGHTS: (f64, f64, f64, f64, f64) = (0.35, 0.20, 0.15, 0.15, 0.15);
/// PES component weights: inverse issue rate, inverse severity,
/// resolution, praise, inverse confusion.
const PES_WEIGHTS: (f64, f64, f64, f64, f64) = (0.30, 0.20, 0.15, 0.15, 0.20);

/// Helpfulness needs brand-reply data the exports do not carry; the
/// component is pinned to the neutral midpoint.
const HELPFULNESS_NEUTRAL: f64 = 50.0;

/// One row of the long-format weekly score table.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyScoreRow {
    pub week_start: NaiveDate,
    pub bank: String,
    pub taxonomy_level: String,
    pub tax_value: String,

    // volumes and post-side aggregates
    pub posts: u64,
    pub comments: u64,
    pub exposure: f64,
    pub weighted_engagement: f64,
    pub zer_norm: f64,
    pub shares: f64,
    pub shares_per_1k_exposure: Option<f64>,
    pub reactions: f64,
    pub post_comments: f64,

    // comment-side aggregates
    pub sentiment_mean: f64,
    pub sentiment_sum: f64,
    pub questions: u64,
    pub confusions: u64,
    pub complaints: u64,
    pub feature_requests: u64,
    pub resolutions: u64,
    pub praises: u64,
    pub severity_sum: f64,
    pub severity_mean: f64,

    // brand experience components
    pub bss_norm: f64,
    pub advocacy_raw: f64,
    pub advocacy_norm: f64,
    pub engagement_component: f64,
    pub helpfulness_component: f64,
    pub confusion_rate: f64,
    pub confusion_norm: f64,

    // product experience components
    pub issue_rate_raw: Option<f64>,
    pub issue_rate_norm: f64,
    pub swi_raw: Option<f64>,
    pub swi_norm: f64,
    pub resolution_rate: f64,
    pub resolution_norm: f64,
    pub praise_rate: f64,
    pub praise_norm: f64,

    pub bes: f64,
    pub pes: f64,
}

impl WeeklyScoreRow {
    /// CSV column order; must track the field order above.
    pub const COLUMNS: &'static [&'static str] = &[
        "week_start",
        "bank",
        "taxonomy_level",
        "tax_value",
        "posts",
        "comments",
        "exposure",
        "weighted_engagement",
        "zer_norm",
        "shares",
        "shares_per_1k_exposure",
        "reactions",
        "post_comments",
        "sentiment_mean",
        "sentiment_sum",
        "questions",
        "confusions",
        "complaints",
        "feature_requests",
        "resolutions",
        "praises",
        "severity_sum",
        "severity_mean",
        "bss_norm",
        "advocacy_raw",
        "advocacy_norm",
        "engagement_component",
        "helpfulness_component",
        "confusion_rate",
        "confusion_norm",
        "issue_rate_raw",
        "issue_rate_norm",
        "swi_raw",
        "swi_norm",
        "resolution_rate",
        "resolution_norm",
        "praise_rate",
        "praise_norm",
        "bes",
        "pes",
    ];
}

#[derive(Debug, Default)]
struct PostAcc {
    posts: u64,
    exposure: f64,
    weighted_engagement: f64,
    zer_norms: Vec<f64>,
    shares: f64,
    shares_per_1k: Vec<f64>,
    reactions: f64,
    post_comments: f64,
}

#[derive(Debug, Default)]
struct CommentAcc {
    comments: u64,
    sentiment_sum: f64,
    questions: u64,
    confusions: u64,
    complaints: u64,
    feature_requests: u64,
    resolutions: u64,
    praises: u64,
    severity_sum: f64,
}

type SliceKey = (NaiveDate, String, String);

/// Computes the weekly BES/PES table at the given taxonomy level.
///
/// Records without a week bucket (unparseable timestamps) are skipped.
/// Output rows are ordered by (week_start, bank, tax_value).
pub fn compute_weekly_scores(
    posts: &[PostFeatures],
    comments: &[CommentFeatures],
    level: TaxonomyLevel,
) -> Vec<WeeklyScoreRow> {
    let mut post_groups: BTreeMap<SliceKey, PostAcc> = BTreeMap::new();
    for p in posts {
        let Some(week) = p.week_start else { continue };
        let label = match level {
            TaxonomyLevel::Theme => &p.labels.theme,
            TaxonomyLevel::Category => &p.labels.category,
            TaxonomyLevel::Subcategory => &p.labels.subcategory,
        };
        let acc = post_groups.entry((week, p.bank.clone(), label.clone())).or_default();
        acc.posts += 1;
        acc.exposure += p.exposure.unwrap_or(0.0);
        acc.weighted_engagement += p.weighted_engagement;
        acc.zer_norms.push(p.zer_norm);
        acc.shares += p.shares;
        if let Some(v) = p.shares_per_1k_exposure {
            acc.shares_per_1k.push(v);
        }
        acc.reactions += p.reactions;
        acc.post_comments += p.comment_count;
    }

    let mut comment_groups: BTreeMap<SliceKey, CommentAcc> = BTreeMap::new();
    for c in comments {
        let Some(week) = c.week_start else { continue };
        let label = match level {
            TaxonomyLevel::Theme => &c.labels.theme,
            TaxonomyLevel::Category => &c.labels.category,
            TaxonomyLevel::Subcategory => &c.labels.subcategory,
        };
        let acc = comment_groups.entry((week, c.bank.clone(), label.clone())).or_default();
        acc.comments += 1;
        acc.sentiment_sum += c.sentiment;
        acc.questions += c.is_question as u64;
        acc.confusions += c.is_confusion as u64;
        acc.complaints += c.is_complaint as u64;
        acc.feature_requests += c.is_feature_request as u64;
        acc.resolutions += c.is_resolution as u64;
        acc.praises += c.is_praise as u64;
        acc.severity_sum += c.severity as f64;
    }

    // Outer join on the slice key; either side may be absent.
    let mut keys: BTreeMap<SliceKey, ()> = BTreeMap::new();
    for k in post_groups.keys() {
        keys.insert(k.clone(), ());
    }
    for k in comment_groups.keys() {
        keys.insert(k.clone(), ());
    }

    debug!(
        level = %level,
        post_slices = post_groups.len(),
        comment_slices = comment_groups.len(),
        joined = keys.len(),
        "Weekly slices grouped"
    );

    let mut rows: Vec<WeeklyScoreRow> = Vec::with_capacity(keys.len());
    for (week, bank, tax_value) in keys.into_keys() {
        let key = (week, bank, tax_value);
        let p = post_groups.remove(&key);
        let c = comment_groups.remove(&key);
        let (week, bank, tax_value) = key;

        let p = p.unwrap_or_default();
        let c = c.unwrap_or_default();

        let sentiment_mean =
            if c.comments > 0 { c.sentiment_sum / c.comments as f64 } else { 0.0 };
        let severity_mean = if c.comments > 0 { c.severity_sum / c.comments as f64 } else { 0.0 };

        // Scale mean sentiment [-1,1] onto [0,100].
        let bss_norm = ((sentiment_mean.clamp(-1.0, 1.0) + 1.0) / 2.0) * 100.0;

        let confusion_rate =
            if c.comments > 0 { c.confusions as f64 / c.comments as f64 } else { 0.0 };

        // Advocacy prefers shares per 1k exposure; shares per post when no
        // post in the slice had an exposure denominator.
        let shares_per_1k = if p.shares_per_1k.is_empty() {
            None
        } else {
            Some(mean(&p.shares_per_1k))
        };
        let advocacy_raw = shares_per_1k.unwrap_or(if p.posts > 0 {
            p.shares / p.posts as f64
        } else {
            0.0
        });

        // The outer join zero-fills post-side aggregates, so a slice with
        // no posts gets a 0 engagement component, not a neutral one.
        let engagement_component =
            if p.zer_norms.is_empty() { 0.0 } else { mean(&p.zer_norms) };

        let issue_mentions = c.complaints as f64;
        let issue_rate_raw = if p.exposure > 0.0 {
            Some(issue_mentions / (p.exposure / 1000.0))
        } else if c.comments > 0 {
            Some(issue_mentions / (c.comments as f64 / 100.0))
        } else {
            None
        };
        let swi_raw =
            if c.complaints > 0 { Some(c.severity_sum / issue_mentions) } else { None };
        let resolution_rate =
            if c.complaints > 0 { c.resolutions as f64 / issue_mentions } else { 0.0 };
        let praise_rate =
            if c.comments > 0 { c.praises as f64 / c.comments as f64 } else { 0.0 };

        rows.push(WeeklyScoreRow {
            week_start: week,
            bank,
            taxonomy_level: level.as_str().to_string(),
            tax_value,
            posts: p.posts,
            comments: c.comments,
            exposure: p.exposure,
            weighted_engagement: p.weighted_engagement,
            zer_norm: engagement_component,
            shares: p.shares,
            shares_per_1k_exposure: shares_per_1k,
            reactions: p.reactions,
            post_comments: p.post_comments,
            sentiment_mean,
            sentiment_sum: c.sentiment_sum,
            questions: c.questions,
            confusions: c.confusions,
            complaints: c.complaints,
            feature_requests: c.feature_requests,
            resolutions: c.resolutions,
            praises: c.praises,
            severity_sum: c.severity_sum,
            severity_mean,
            bss_norm,
            advocacy_raw,
            advocacy_norm: 0.0,
            engagement_component,
            helpfulness_component: HELPFULNESS_NEUTRAL,
            confusion_rate,
            confusion_norm: 0.0,
            issue_rate_raw,
            issue_rate_norm: 0.0,
            swi_raw,
            swi_norm: 0.0,
            resolution_rate,
            resolution_norm: 0.0,
            praise_rate,
            praise_norm: 0.0,
            bes: 0.0,
            pes: 0.0,
        });
    }

    normalize_within_groups(&mut rows);
    blend_scores(&mut rows);
    rows
}

/// Percentile-normalizes the raw sub-scores within each
/// `(bank, tax_value)` group across weeks. Constant or single-member
/// groups come out at the neutral 50; missing raw values inside a mixed
/// group normalize to 50 as well.
fn normalize_within_groups(rows: &mut [WeeklyScoreRow]) {
    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups.entry((row.bank.clone(), row.tax_value.clone())).or_default().push(i);
    }

    for indices in groups.values() {
        apply_norm(rows, indices, |r| Some(r.advocacy_raw), |r, v| r.advocacy_norm = v);
        apply_norm(rows, indices, |r| Some(r.confusion_rate), |r, v| r.confusion_norm = v);
        apply_norm(rows, indices, |r| r.issue_rate_raw, |r, v| r.issue_rate_norm = v);
        apply_norm(rows, indices, |r| r.swi_raw, |r, v| r.swi_norm = v);
        apply_norm(rows, indices, |r| Some(r.resolution_rate), |r, v| r.resolution_norm = v);
        apply_norm(rows, indices, |r| Some(r.praise_rate), |r, v| r.praise_norm = v);
    }
}

fn apply_norm(
    rows: &mut [WeeklyScoreRow],
    indices: &[usize],
    get: impl Fn(&WeeklyScoreRow) -> Option<f64>,
    set: impl Fn(&mut WeeklyScoreRow, f64),
) {
    let present: Vec<(usize, f64)> = indices
        .iter()
        .filter_map(|&i| get(&rows[i]).filter(|v| v.is_finite()).map(|v| (i, v)))
        .collect();

    let values: Vec<f64> = present.iter().map(|(_, v)| *v).collect();
    let ranks = percentile_ranks(&values);

    let mut ranked: HashMap<usize, f64> = HashMap::with_capacity(present.len());
    for ((i, _), rank) in present.iter().zip(ranks) {
        ranked.insert(*i, rank);
    }

    for &i in indices {
        let v = ranked.get(&i).copied().unwrap_or(50.0);
        set(&mut rows[i], v);
    }
}

/// Fixed-weight linear blends, clipped to [0,100].
fn blend_scores(rows: &mut [WeeklyScoreRow]) {
    for r in rows.iter_mut() {
        let (w_sent, w_adv, w_eng, w_help, w_conf) = BES_WEIGHTS;
        r.bes = (w_sent * r.bss_norm
            + w_adv * r.advocacy_norm
            + w_eng * r.engagement_component
            + w_help * r.helpfulness_component
            + w_conf * (100.0 - r.confusion_norm))
            .clamp(0.0, 100.0);

        let (w_issue, w_swi, w_res, w_praise, w_conf) = PES_WEIGHTS;
        r.pes = (w_issue * (100.0 - r.issue_rate_norm)
            + w_swi * (100.0 - r.swi_norm)
            + w_res * r.resolution_norm
            + w_praise * r.praise_norm
            + w_conf * (100.0 - r.confusion_norm))
            .clamp(0.0, 100.0);
    }
}
