//! Sitemap Crawler main entry point
//!
//! This is the command-line interface for crawling a site's sitemap, resolving
//! a single URL's redirect chain, or comparing two sites.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sitemap_crawler::config::{load_config_with_hash, validate, Config, OutputFormat};
use sitemap_crawler::crawler::Coordinator;
use sitemap_crawler::output::{handler_for, write_output, CrawlStatistics};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sitemap Crawler: redirect-chain and SEO auditing for every URL in a sitemap
///
/// The crawler discovers a site's sitemap (following sitemap indices and
/// common fallback locations), resolves each URL's redirect chain hop by hop,
/// and scores the final page's metadata.
#[derive(Parser, Debug)]
#[command(name = "sitemap-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Sitemap redirect-chain and SEO auditor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Report format
    #[arg(short, long, value_enum, global = true)]
    format: Option<FormatArg>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH", global = true)]
    output: Option<PathBuf>,

    /// Maximum number of chains resolved at once
    #[arg(long, global = true)]
    concurrency: Option<u32>,

    /// Per-hop request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Maximum redirects followed per URL
    #[arg(long, global = true)]
    max_hops: Option<u32>,

    /// Retries per hop after a network failure
    #[arg(long, global = true)]
    retries: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every URL in a site's sitemap
    Crawl {
        /// Domain or full sitemap URL
        site: String,
    },

    /// Resolve the redirect chain of a single URL
    Single {
        /// URL to resolve; https:// is assumed when no scheme is given
        url: String,
    },

    /// Compare the final pages of two sites
    Compare {
        site_a: String,
        site_b: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let coordinator = Coordinator::new(&config).context("failed to build HTTP clients")?;
    let handler = handler_for(config.output.format);

    let document = match &cli.command {
        Command::Crawl { site } => {
            let report = coordinator.crawl_site(site).await?;
            let stats = CrawlStatistics::from_results(&report.results);
            tracing::info!(
                "{} URLs crawled, average score {:.1}, {} redirected, {} failed",
                report.processed,
                stats.average_score,
                stats.redirected,
                stats.errored
            );
            handler.render_crawl(&report)?
        }
        Command::Single { url } => {
            let result = coordinator.crawl_single(url).await?;
            handler.render_single(&result)?
        }
        Command::Compare { site_a, site_b } => {
            let report = coordinator.compare_sites(site_a, site_b).await?;
            handler.render_comparison(&report)?
        }
    };

    write_output(&document, config.output.path.as_deref().map(Path::new))?;

    Ok(())
}

/// Loads the configuration file, if any, and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.crawler.timeout_ms = timeout_ms;
    }
    if let Some(max_hops) = cli.max_hops {
        config.crawler.max_hops = max_hops;
    }
    if let Some(retries) = cli.retries {
        config.crawler.max_retries_per_hop = retries;
    }
    if let Some(format) = cli.format {
        config.output.format = format.into();
    }
    if let Some(path) = &cli.output {
        config.output.path = Some(path.display().to_string());
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so a report written to stdout stays clean.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemap_crawler=info,warn"),
            1 => EnvFilter::new("sitemap_crawler=debug,info"),
            2 => EnvFilter::new("sitemap_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
