//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable.

use crate::harvest::{BODY_MAX_CHARS, DEFAULT_BASE_URL, HarvestConfig};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Harvest IFPI news and classify them by notice, topic and campus.
///
/// # Examples
///
/// ```sh
/// # Harvest, then classify
/// ifpi_news scrape
/// ifpi_news analyze
///
/// # Both stages in one process, with a custom NER model
/// ifpi_news run --ner-model ./config/ner_pt.yaml
///
/// # Re-print the notice counts without re-running anything
/// ifpi_news summary --exclude-unmapped
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Harvest table (written by `scrape`, read by `analyze`)
    #[arg(long, global = true, env = "NEWS_FILE", default_value = "./data/noticias_ifpi.csv")]
    pub news_file: PathBuf,

    /// Analysis table (written by `analyze`, read by `summary`)
    #[arg(long, global = true, env = "ANALYSIS_FILE", default_value = "./data/analise_editais.csv")]
    pub analysis_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch listing pages and article bodies into the harvest table
    Scrape(HarvestArgs),
    /// Classify the harvest table into the analysis table
    Analyze {
        #[command(flatten)]
        classify: ClassifyArgs,
        #[command(flatten)]
        summary: SummaryArgs,
    },
    /// Scrape then analyze in one run
    Run {
        #[command(flatten)]
        harvest: HarvestArgs,
        #[command(flatten)]
        classify: ClassifyArgs,
        #[command(flatten)]
        summary: SummaryArgs,
    },
    /// Print notice counts per campus and topic from the analysis table
    Summary(SummaryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Listing page URL; pages are addressed with `b_start:int=<offset>`
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    /// Items per listing page
    #[arg(
        long,
        env = "PAGE_SIZE",
        default_value_t = 30,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=1_000)
    )]
    pub page_size: usize,

    /// Number of listing pages to request
    #[arg(
        long,
        env = "MAX_PAGES",
        default_value_t = 10,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=10_000)
    )]
    pub max_pages: usize,

    /// Maximum requests in flight at once
    #[arg(
        long,
        env = "MAX_CONCURRENCY",
        default_value_t = 5,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=256)
    )]
    pub max_concurrency: usize,

    /// Timeout for each listing page request
    #[arg(long, env = "LISTING_TIMEOUT_SECS", default_value_t = 15)]
    pub listing_timeout_secs: u64,

    /// Timeout for each article request
    #[arg(long, env = "ARTICLE_TIMEOUT_SECS", default_value_t = 60)]
    pub article_timeout_secs: u64,
}

impl HarvestArgs {
    pub fn to_config(&self) -> HarvestConfig {
        HarvestConfig {
            base_url: self.base_url.clone(),
            page_size: self.page_size,
            max_pages: self.max_pages,
            listing_timeout: Duration::from_secs(self.listing_timeout_secs),
            article_timeout: Duration::from_secs(self.article_timeout_secs),
            body_max_chars: BODY_MAX_CHARS,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// YAML override for topic rules, notice keywords and campus aliases
    #[arg(long, env = "RULES_FILE")]
    pub rules: Option<PathBuf>,

    /// Gazetteer NER model
    #[arg(long, env = "NER_MODEL", default_value = "./config/ner_pt.yaml")]
    pub ner_model: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    /// Leave out records whose campus could not be mapped
    #[arg(long)]
    pub exclude_unmapped: bool,

    /// Also write the counts as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_defaults() {
        let cli = Cli::parse_from(["ifpi_news", "scrape"]);
        assert_eq!(cli.news_file, PathBuf::from("./data/noticias_ifpi.csv"));
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        let cfg = args.to_config();
        assert_eq!(cfg.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(cfg.page_size, 30);
        assert_eq!(cfg.max_pages, 10);
        assert_eq!(args.max_concurrency, 5);
        assert_eq!(cfg.listing_timeout, Duration::from_secs(15));
        assert_eq!(cfg.article_timeout, Duration::from_secs(60));
        assert_eq!(cfg.body_max_chars, 2000);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "ifpi_news",
            "run",
            "--max-pages",
            "2",
            "--max-concurrency",
            "3",
            "--ner-model",
            "/tmp/ner.yaml",
            "--exclude-unmapped",
            "--analysis-file",
            "/tmp/out.csv",
        ]);
        assert_eq!(cli.analysis_file, PathBuf::from("/tmp/out.csv"));
        let Command::Run {
            harvest,
            classify,
            summary,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(harvest.max_pages, 2);
        assert_eq!(harvest.max_concurrency, 3);
        assert_eq!(classify.ner_model, PathBuf::from("/tmp/ner.yaml"));
        assert!(classify.rules.is_none());
        assert!(summary.exclude_unmapped);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let res = Cli::try_parse_from(["ifpi_news", "scrape", "--base-url", "not a url"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_out_of_range_counts_rejected() {
        for (flag, value) in [
            ("--page-size", "0"),
            ("--page-size", "18446744073709551615"),
            ("--max-pages", "10001"),
            ("--max-concurrency", "0"),
        ] {
            let res = Cli::try_parse_from(["ifpi_news", "scrape", flag, value]);
            assert!(res.is_err(), "{flag} {value} should be rejected");
        }

        let cli = Cli::parse_from(["ifpi_news", "scrape", "--page-size", "1000"]);
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.page_size, 1000);
    }
}
