//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest catalogue crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use sumi_harvest::config::{load_config_with_hash, Config, MAX_DETAIL_CONCURRENCY};
use sumi_harvest::crawler::{build_orchestrator, Pagination};
use sumi_harvest::output::{export_report, print_statistics, CrawlStatistics};
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A paginated catalogue crawler
///
/// Sumi-Harvest walks the listing pages of a product catalogue, follows each
/// item to its detail page under a bounded worker pool, and exports one row
/// per product.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paginated catalogue crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Last listing page to visit (overrides crawler.max-pages)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Detail pages fetched at once (overrides crawler.detail-concurrency)
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Export destination (overrides output.path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let page_limit = cli.max_pages.or(config.crawler.max_pages);
    let concurrency = cli
        .concurrency
        .unwrap_or(config.crawler.detail_concurrency as usize);
    if concurrency == 0 || concurrency > MAX_DETAIL_CONCURRENCY as usize {
        anyhow::bail!(
            "--concurrency must be between 1 and {}",
            MAX_DETAIL_CONCURRENCY
        );
    }

    if cli.dry_run {
        handle_dry_run(&config, page_limit, concurrency)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut orchestrator = build_orchestrator(&config).context("Failed to set up the crawl")?;
    let report = orchestrator.run(page_limit, concurrency).await;

    if report.termination.is_clean() {
        tracing::info!("Crawl finished: {}", report.termination);
    } else {
        tracing::error!("Crawl stopped early: {}", report.termination);
    }

    let written = export_report(
        &config.output,
        cli.output.as_deref(),
        &report,
        &config_hash,
    )
    .context("Failed to export records")?;

    if !cli.quiet {
        print_statistics(&CrawlStatistics::from_report(&report));
        println!("\nWrote {} records", written);
    }

    Ok(ExitCode::from(report.termination.exit_code()))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(
    config: &Config,
    page_limit: Option<u32>,
    concurrency: usize,
) -> anyhow::Result<()> {
    let pagination = Pagination::new(&config.site.base_url, &config.site.listing_template)?;

    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", pagination.base_url());
    println!("  First listing page: {}", pagination.page_url(1));
    println!();

    println!("Crawler Configuration:");
    match page_limit {
        Some(limit) => println!("  Page limit: {}", limit),
        None => println!("  Page limit: none (until an empty page)"),
    }
    println!("  Detail concurrency: {}", concurrency);
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    match config.crawler.recycle_client_every {
        Some(every) => println!("  Client recycled every {} pages", every),
        None => println!("  Client recycling: disabled"),
    }
    println!("  Deduplicate by URL: {}", config.crawler.dedupe_by_url);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nImages:");
    if config.images.enabled {
        println!("  Stored under: {}", config.images.directory);
    } else {
        println!("  Disabled (listing URLs are exported as-is)");
    }

    println!("\nOutput:");
    println!("  {:?} at {}", config.output.format, config.output.path);

    println!("\n✓ Configuration is valid");

    Ok(())
}
