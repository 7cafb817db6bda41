//! CLI entry point for the BES/PES rater.
//!
//! Provides subcommands for running the full weekly scoring pipeline over
//! post/comment exports and for classifying ad-hoc text against a
//! taxonomy during curation.

use anyhow::{Context, Result};
use bes_pes_rater::dashboard::make_wide_dashboard;
use bes_pes_rater::features::{
    COMMENT_TEXT_COLUMN, POST_CAPTION_COLUMN, apply_taxonomy, build_comment_features,
    build_post_features,
};
use bes_pes_rater::output::{
    comment_feature_columns, post_feature_columns, taxonomy_columns, write_table_with_columns,
    write_weekly, write_wide,
};
use bes_pes_rater::records::RawTable;
use bes_pes_rater::sentiment::lexicon::Lexicons;
use bes_pes_rater::sentiment::remote::DEFAULT_SENTIMENT_MODEL;
use bes_pes_rater::sentiment::{SentimentEngine, SentimentScorer};
use bes_pes_rater::taxonomy::matcher::{DEFAULT_MIN_SCORE, best_taxonomy_match};
use bes_pes_rater::taxonomy::{TaxonomyLevel, load_taxonomy};
use bes_pes_rater::weekly::compute_weekly_scores;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bes_pes_rater")]
#[command(about = "Weekly BES/PES scoring for bank social media exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: taxonomy, features, weekly scores, dashboards
    Run {
        /// Path to the denormalized posts CSV
        #[arg(long)]
        posts: PathBuf,

        /// Path to the denormalized comments CSV
        #[arg(long)]
        comments: PathBuf,

        /// Path to the taxonomy JSON document
        #[arg(long)]
        taxonomy: PathBuf,

        /// Directory for stage output CSVs (created if absent)
        #[arg(short, long, default_value = "outputs")]
        outdir: PathBuf,

        /// Minimum taxonomy match score; lower-scoring records stay Uncategorized
        #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
        tax_min_score: f64,

        /// Sentiment backend: auto, remote, or lexicon
        #[arg(long, default_value = "auto")]
        sentiment_engine: String,

        /// Model identifier passed to the remote sentiment service
        #[arg(long, default_value = DEFAULT_SENTIMENT_MODEL)]
        sentiment_model: String,
    },
    /// Classify a single text against a taxonomy (curation aid)
    Classify {
        /// Path to the taxonomy JSON document
        #[arg(long)]
        taxonomy: PathBuf,

        /// Text to classify
        #[arg(value_name = "TEXT")]
        text: String,

        /// Minimum taxonomy match score
        #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
        min_score: f64,

        /// Taxonomy level to report: theme, category, or subcategory
        #[arg(long, default_value = "subcategory")]
        level: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bes_pes_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bes_pes_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            posts,
            comments,
            taxonomy,
            outdir,
            tax_min_score,
            sentiment_engine,
            sentiment_model,
        } => {
            let engine: SentimentEngine = sentiment_engine.parse()?;
            run_pipeline(
                &posts,
                &comments,
                &taxonomy,
                &outdir,
                tax_min_score,
                engine,
                &sentiment_model,
            )
            .await?;
        }
        Commands::Classify { taxonomy, text, min_score, level } => {
            let level: TaxonomyLevel = level.parse()?;
            let taxons = load_taxonomy(&taxonomy)?;
            let m = best_taxonomy_match(&text, &taxons, min_score);
            info!(
                theme = %m.theme,
                category = %m.category,
                subcategory = %m.subcategory,
                score = m.score,
                label = %m.label_at(level),
                "Best taxonomy match"
            );
        }
    }

    Ok(())
}

/// One-shot batch run over static post/comment snapshots.
#[tracing::instrument(skip_all, fields(outdir = %outdir.display()))]
async fn run_pipeline(
    posts_path: &Path,
    comments_path: &Path,
    taxonomy_path: &Path,
    outdir: &Path,
    tax_min_score: f64,
    engine: SentimentEngine,
    model: &str,
) -> Result<()> {
    std::fs::create_dir_all(outdir)
        .with_context(|| format!("creating output directory {}", outdir.display()))?;

    info!("[1/4] Loading inputs");
    let posts = RawTable::from_csv_path(posts_path)?;
    let comments = RawTable::from_csv_path(comments_path)?;
    let taxons = load_taxonomy(taxonomy_path)?;
    info!(
        posts = posts.len(),
        comments = comments.len(),
        taxons = taxons.len(),
        "Inputs loaded"
    );

    let scorer = SentimentScorer::new(engine, Some(model), Lexicons::bangladesh_default())?;

    info!("[2/4] Applying taxonomy");
    let post_matches = apply_taxonomy(&posts, &[POST_CAPTION_COLUMN], &taxons, tax_min_score);
    // Comments carry their parent post caption as context.
    let comment_matches = apply_taxonomy(
        &comments,
        &[COMMENT_TEXT_COLUMN, POST_CAPTION_COLUMN],
        &taxons,
        tax_min_score,
    );

    let (post_tax_headers, post_tax_cells) = taxonomy_columns("post", &post_matches);
    write_table_with_columns(
        &outdir.join("posts_with_taxonomy.csv"),
        &posts,
        &post_tax_headers,
        &post_tax_cells,
    )?;
    let (com_tax_headers, com_tax_cells) = taxonomy_columns("comment", &comment_matches);
    write_table_with_columns(
        &outdir.join("comments_with_taxonomy.csv"),
        &comments,
        &com_tax_headers,
        &com_tax_cells,
    )?;

    info!("[3/4] Engineering features");
    let post_features = build_post_features(&posts, &post_matches)?;
    let comment_features = build_comment_features(&comments, &comment_matches, &scorer).await?;

    let (feat_headers, feat_cells) = post_feature_columns(&post_features);
    write_table_with_columns(
        &outdir.join("posts_with_features.csv"),
        &posts,
        &[post_tax_headers.clone(), feat_headers].concat(),
        &zip_cells(&post_tax_cells, &feat_cells),
    )?;
    let (cfeat_headers, cfeat_cells) = comment_feature_columns(&comment_features);
    write_table_with_columns(
        &outdir.join("comments_with_features.csv"),
        &comments,
        &[com_tax_headers.clone(), cfeat_headers].concat(),
        &zip_cells(&com_tax_cells, &cfeat_cells),
    )?;

    info!("[4/4] Computing weekly BES/PES tables and dashboards");
    for level in TaxonomyLevel::ALL {
        let weekly = compute_weekly_scores(&post_features, &comment_features, level);
        write_weekly(&outdir.join(format!("weekly_bes_pes_{level}.csv")), &weekly)?;

        let wide = make_wide_dashboard(&weekly, level);
        write_wide(&outdir.join(format!("wide_dashboard_{level}.csv")), &wide)?;
    }

    info!("Done");
    Ok(())
}

/// Concatenates two per-row cell blocks row by row.
fn zip_cells(a: &[Vec<String>], b: &[Vec<String>]) -> Vec<Vec<String>> {
    a.iter().zip(b.iter()).map(|(x, y)| [x.clone(), y.clone()].concat()).collect()
}
