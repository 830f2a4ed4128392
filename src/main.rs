//! Affiliate Scout main entry point
//!
//! This is the command-line interface for the Affiliate Scout sitemap analyzer.

use affiliate_scout::config::{compute_config_hash, parse_config, validate, Config};
use affiliate_scout::dispatch::{AnalysisReport, Coordinator};
use affiliate_scout::output::{print_statistics, render_json, render_markdown, render_text, RunStatistics};
use affiliate_scout::provider::{ProviderClient, ProviderKind};
use affiliate_scout::sitemap::{build_sitemap_client, fetch_sitemap, parse_sitemap};
use affiliate_scout::WorkerCredential;
use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Affiliate Scout: affiliate monetization analysis for every page in a sitemap
///
/// Affiliate Scout reads a sitemap, sends each page URL to a pool of AI provider
/// credentials, and reports a monetization score, priority and suggested actions
/// for every page.
#[derive(Parser, Debug)]
#[command(name = "affiliate-scout")]
#[command(version)]
#[command(about = "Sitemap-driven affiliate monetization analysis", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["sitemap_file", "sitemap_url"])))]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Read sitemap XML from a file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    sitemap_file: Option<PathBuf>,

    /// Fetch sitemap XML from a URL through the configured proxies
    #[arg(long, value_name = "URL")]
    sitemap_url: Option<String>,

    /// Override the number of concurrent analysis lanes
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Add a worker for this provider to the pool
    #[arg(long, value_name = "PROVIDER", value_parser = parse_provider)]
    provider: Option<ProviderKind>,

    /// API key for the --provider worker
    #[arg(long, value_name = "KEY", requires = "provider")]
    api_key: Option<String>,

    /// Model for the --provider worker (required for openrouter and groq)
    #[arg(long, value_name = "MODEL", requires = "provider")]
    model: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Validate config and sitemap and show what would be analyzed without calling any provider
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Markdown,
    Json,
}

fn parse_provider(s: &str) -> std::result::Result<ProviderKind, String> {
    s.parse().map_err(|e: affiliate_scout::AnalysisError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;
    let urls = load_urls(&cli, &config).await?;

    if cli.dry_run {
        handle_dry_run(&config, &urls);
        return Ok(());
    }

    let report = handle_analysis(config, urls).await?;

    match cli.format {
        Format::Text => {
            print!("{}", render_text(&report));
            println!();
            print_statistics(&RunStatistics::from_report(&report));
        }
        Format::Markdown => print!("{}", render_markdown(&report)),
        Format::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("affiliate_scout=info,warn"),
            1 => EnvFilter::new("affiliate_scout=debug,info"),
            2 => EnvFilter::new("affiliate_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file, applies command-line overrides, then validates
fn load_configuration(cli: &Cli) -> Result<Config> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = parse_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let hash = compute_config_hash(&cli.config)?;

    if let Some(concurrency) = cli.concurrency {
        config.dispatch.concurrency = concurrency;
    }

    if let Some(provider) = cli.provider {
        let mut worker = WorkerCredential::new(
            format!("cli-{}", provider),
            provider,
            cli.api_key.clone(),
        );
        if let Some(model) = &cli.model {
            worker = worker.with_model(model.clone());
        }
        tracing::debug!("Adding command-line worker {:?}", worker);
        config.workers.push(worker);
    }

    validate(&config).context("Invalid configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Reads sitemap XML from the selected source and extracts its URLs
async fn load_urls(cli: &Cli, config: &Config) -> Result<Vec<String>> {
    let xml = match (&cli.sitemap_file, &cli.sitemap_url) {
        (Some(path), _) if path.as_os_str() == "-" => {
            let mut xml = String::new();
            std::io::stdin()
                .read_to_string(&mut xml)
                .context("Failed to read sitemap from stdin")?;
            xml
        }
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sitemap file {}", path.display()))?,
        (None, Some(url)) => {
            let client = build_sitemap_client(&config.sitemap)?;
            fetch_sitemap(&client, url, &config.sitemap.proxies).await?
        }
        (None, None) => anyhow::bail!("either --sitemap-file or --sitemap-url is required"),
    };

    let urls = parse_sitemap(&xml)?;
    tracing::info!("Found {} URLs in sitemap", urls.len());
    Ok(urls)
}

/// Handles the --dry-run mode: shows what would be analyzed
fn handle_dry_run(config: &Config, urls: &[String]) {
    println!("=== Affiliate Scout Dry Run ===\n");

    println!("Dispatch Configuration:");
    println!("  Concurrency: {}", config.dispatch.concurrency);
    println!("  Request timeout: {}s", config.dispatch.request_timeout_secs);
    println!("  Max attempts: {}", config.dispatch.max_attempts);

    println!("\nWorker Pool ({}):", config.workers.len());
    for worker in &config.workers {
        let model = worker
            .provider
            .resolve_model(worker)
            .unwrap_or("<missing model>");
        println!("  - {} ({}, model {})", worker.id, worker.provider, model);
    }

    println!("\nURLs ({}):", urls.len());
    for url in urls.iter().take(20) {
        println!("  - {}", url);
    }
    if urls.len() > 20 {
        println!("  ... and {} more", urls.len() - 20);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would analyze {} URLs with {} lanes",
        urls.len(),
        (config.dispatch.concurrency as usize).clamp(1, urls.len().max(1))
    );
}

/// Handles the main analysis run
async fn handle_analysis(config: Config, urls: Vec<String>) -> Result<AnalysisReport> {
    let client = ProviderClient::from_config(&config).context("Failed to build HTTP client")?;
    let coordinator = Coordinator::new(client, &urls, &config.workers, &config.dispatch);

    let mut events = coordinator.take_events();
    let progress_log = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let progress = event.progress;
            match event.result.outcome.data() {
                Some(data) => tracing::info!(
                    "[{}/{}] {} scored {} ({})",
                    progress.processed,
                    progress.total,
                    event.result.url,
                    data.monetization_score,
                    data.priority
                ),
                None => tracing::warn!(
                    "[{}/{}] {} failed",
                    progress.processed,
                    progress.total,
                    event.result.url
                ),
            }
        }
    });

    let cancel = coordinator.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            cancel.cancel();
        }
    });

    let result = coordinator.run().await;
    interrupt.abort();
    // The event stream closes when the run finishes
    let _ = progress_log.await;

    match result {
        Ok(report) => {
            tracing::info!(
                "Analysis completed in {}s",
                report.duration().num_seconds()
            );
            Ok(report)
        }
        Err(e) => {
            tracing::error!("Analysis failed: {}", e);
            Err(e.into())
        }
    }
}
