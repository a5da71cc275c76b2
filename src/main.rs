//! # IFPI News
//!
//! Harvests the IFPI "últimas notícias" listing, then classifies every
//! article: is it a public notice (edital), which topic does it belong to,
//! and which campus does it talk about.
//!
//! ## Usage
//!
//! ```sh
//! ifpi_news run
//! ```
//!
//! ## Architecture
//!
//! The application follows a two-stage pipeline:
//! 1. **Scrape**: fetch listing pages and article bodies under a shared
//!    concurrency cap, writing `titulo, link, data, texto`
//! 2. **Analyze**: load the NER model, classify each record, writing
//!    `titulo, link, data, Is_Edital, Campus_Citado, Topico_Classificado`,
//!    then print notice counts per campus and topic
//!
//! Per-article failures become data in the tables. Missing models or input
//! files abort the stage before any output is written.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classify;
mod cli;
mod errors;
mod fetcher;
mod harvest;
mod models;
mod outputs;
mod scrapers;
mod utils;

use classify::Classifier;
use classify::config::ClassifierConfig;
use classify::ner::GazetteerRecognizer;
use cli::{ClassifyArgs, Cli, Command, HarvestArgs, SummaryArgs};
use errors::StageError;
use fetcher::{HttpFetcher, RateLimited};
use models::{AnalyzedRecord, ArticleRecord};
use outputs::{summary, table};
use utils::ensure_parent_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    let args = Cli::parse();
    info!(command = ?args.command, "ifpi_news starting up");

    let result = match &args.command {
        Command::Scrape(harvest_args) => scrape(harvest_args, &args.news_file).await.map(|_| ()),
        Command::Analyze { classify, summary } => {
            analyze_stage(classify, summary, &args.news_file, &args.analysis_file).await
        }
        Command::Run {
            harvest,
            classify,
            summary,
        } => run_all(harvest, classify, summary, &args).await,
        Command::Summary(summary_args) => summary_stage(summary_args, &args.analysis_file).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

/// Load the rules and the NER model. Runs before any harvesting or reading,
/// so an unusable model aborts the stage up front.
fn load_classifier(args: &ClassifyArgs) -> Result<(ClassifierConfig, GazetteerRecognizer), StageError> {
    let config = match &args.rules {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };
    let model = GazetteerRecognizer::load(&args.ner_model)?;
    Ok((config, model))
}

#[instrument(level = "info", skip_all, fields(news_file = %news_file.display()))]
async fn scrape(args: &HarvestArgs, news_file: &Path) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
    let config = args.to_config();
    let fetcher = RateLimited::new(HttpFetcher::new()?, args.max_concurrency);
    info!(
        base_url = %config.base_url,
        pages = config.max_pages,
        page_size = config.page_size,
        concurrency = fetcher.limit(),
        "Starting harvest"
    );

    let report = harvest::harvest(&fetcher, &config).await;
    info!(
        records = report.records.len(),
        pages_planned = report.pages_planned,
        pages_failed = report.pages_failed,
        articles_failed = report.articles_failed,
        "Harvest finished"
    );

    if report.records.is_empty() {
        warn!("No articles harvested; nothing to save");
        return Ok(report.records);
    }
    table::write_records(news_file, &report.records).await?;
    info!(path = %news_file.display(), count = report.records.len(), "Saved harvest table");
    Ok(report.records)
}

async fn analyze_stage(
    classify_args: &ClassifyArgs,
    summary_args: &SummaryArgs,
    news_file: &Path,
    analysis_file: &Path,
) -> Result<(), Box<dyn Error>> {
    let (config, model) = load_classifier(classify_args)?;
    let records = table::read_articles(news_file).await?;
    let analyzed = analyze(config, &model, &records, analysis_file).await?;
    report_summary(&analyzed, summary_args).await?;
    Ok(())
}

async fn run_all(
    harvest_args: &HarvestArgs,
    classify_args: &ClassifyArgs,
    summary_args: &SummaryArgs,
    args: &Cli,
) -> Result<(), Box<dyn Error>> {
    let (config, model) = load_classifier(classify_args)?;
    let records = scrape(harvest_args, &args.news_file).await?;
    let analyzed = analyze(config, &model, &records, &args.analysis_file).await?;
    report_summary(&analyzed, summary_args).await?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(records = records.len()))]
async fn analyze(
    config: ClassifierConfig,
    model: &GazetteerRecognizer,
    records: &[ArticleRecord],
    analysis_file: &Path,
) -> Result<Vec<AnalyzedRecord>, StageError> {
    let failed = records.iter().filter(|r| r.fetch_error.is_some()).count();
    if failed > 0 {
        warn!(failed, "Some records carry fetch errors; they are classified from their titles");
    }

    let classifier = Classifier::new(config, model);
    let analyzed = classifier.analyze(records);

    if analyzed.is_empty() {
        warn!("No records to classify; nothing to save");
        return Ok(analyzed);
    }
    table::write_records(analysis_file, &analyzed).await?;
    info!(path = %analysis_file.display(), count = analyzed.len(), "Saved analysis table");
    Ok(analyzed)
}

/// Read-only consumer of the analysis table. A missing or empty table is
/// reported, not treated as a failure.
async fn summary_stage(args: &SummaryArgs, analysis_file: &Path) -> Result<(), Box<dyn Error>> {
    match table::read_records::<AnalyzedRecord>(analysis_file, "analyze").await {
        Ok(rows) => report_summary(&rows, args).await.map_err(Into::into),
        Err(e @ StageError::InputMissing { .. }) => {
            warn!(error = %e, "Analysis table not found");
            eprintln!("{e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn report_summary(rows: &[AnalyzedRecord], args: &SummaryArgs) -> Result<(), StageError> {
    let summary = summary::summarize(rows, args.exclude_unmapped);
    info!(records = summary.records, notices = summary.notices, "Summarized notices");

    if let Some(reason) = summary::empty_reason(&summary) {
        warn!(
            records = summary.records,
            excluded = summary.notices_excluded,
            "{reason}"
        );
        println!("{reason}");
    } else {
        println!("\n--- Notices per campus and topic ---");
        print!("{}", summary::render(&summary));
    }

    if let Some(path) = &args.json {
        ensure_parent_dir(path).await?;
        tokio::fs::write(path, serde_json::to_string_pretty(&summary)?).await?;
        info!(path = %path.display(), "Wrote summary JSON");
    }
    Ok(())
}
