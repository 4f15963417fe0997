//! Volume Census main entry point
//!
//! This is the command-line interface for counting the files behind a
//! catalog of static per-volume directory listings.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use volume_census::config::{load_config_with_hash, validate, Config};
use volume_census::crawler::run_census;
use volume_census::metadata::{count_reporters, extract_work_items, load_volumes};
use volume_census::output::{
    count_groups, export_csv, format_bytes, format_count, load_snapshot, print_report,
};
use volume_census::CensusError;

/// Exit status of a run stopped by Ctrl-C (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

/// Volume Census: count and size the files in static directory listings
///
/// Reads volume metadata, derives one `{reporter}/{volume}/cases/` listing
/// per unique pair, fetches every listing concurrently and aggregates file
/// counts and sizes. Results are saved as JSON and can be flattened to CSV.
#[derive(Parser, Debug)]
#[command(name = "volume-census")]
#[command(version)]
#[command(about = "Count and size files across static directory listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (all keys optional)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path of the JSON results document
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Root URL of the listing host
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path to the volumes metadata JSON
    #[arg(long, value_name = "PATH")]
    volumes: Option<PathBuf>,

    /// Path to the reporters metadata JSON
    #[arg(long, value_name = "PATH")]
    reporters: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and count work items without fetching anything
    #[arg(long, conflicts_with_all = ["export_csv", "count_groups"])]
    dry_run: bool,

    /// Convert an existing results document to summary and detail CSV, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "count_groups"])]
    export_csv: bool,

    /// Count the distinct groups in a summary CSV, then exit
    #[arg(long, value_name = "CSV", conflicts_with_all = ["dry_run", "export_csv"])]
    count_groups: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("volume_census=info,warn"),
            1 => EnvFilter::new("volume_census=debug,info"),
            2 => EnvFilter::new("volume_census=trace,debug"),
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

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Some(csv_path) = &cli.count_groups {
        handle_count_groups(csv_path)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.export_csv {
        handle_export_csv(&config)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_census(config).await
    }
}

/// Loads the config file (if any), applies CLI overrides and validates the result
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(workers) = cli.workers {
        config.crawler.max_workers = workers;
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.display().to_string();
    }
    if let Some(base_url) = &cli.base_url {
        config.crawler.base_url = base_url.clone();
    }
    if let Some(volumes) = &cli.volumes {
        config.input.volumes_path = volumes.display().to_string();
    }
    if let Some(reporters) = &cli.reporters {
        config.input.reporters_path = reporters.display().to_string();
    }

    validate(&config).context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

/// Loads the metadata inputs and derives the work item list
fn load_work_items(
    config: &Config,
) -> Result<(usize, usize, Vec<volume_census::WorkItem>), CensusError> {
    tracing::info!("Loading metadata files...");
    let volumes = load_volumes(Path::new(&config.input.volumes_path))?;
    let reporters = count_reporters(Path::new(&config.input.reporters_path))?;
    tracing::info!(
        "Loaded {} volumes and {} reporters",
        format_count(volumes.len() as u64),
        format_count(reporters as u64)
    );

    let items = extract_work_items(&volumes);
    tracing::info!(
        "Found {} unique reporter/volume combinations",
        format_count(items.len() as u64)
    );

    Ok((volumes.len(), reporters, items))
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Volume Census Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Workers: {}", config.crawler.max_workers);
    println!("  Attempts per listing: {}", config.crawler.max_retries);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Retry backoff: {}ms x attempt", config.crawler.retry_backoff_ms);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nInput:");
    println!("  Volumes: {}", config.input.volumes_path);
    println!("  Reporters: {}", config.input.reporters_path);

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    println!("  Summary CSV: {}", config.output.summary_csv_path);
    println!("  Detailed CSV: {}", config.output.detailed_csv_path);

    let (volumes, reporters, items) = load_work_items(config)?;

    println!("\nMetadata:");
    println!("  Volume records: {}", format_count(volumes as u64));
    println!("  Reporter records: {}", format_count(reporters as u64));
    println!("  Unique work items: {}", format_count(items.len() as u64));
    for item in items.iter().take(5) {
        println!("    * {}", item.listing_path());
    }
    if items.len() > 5 {
        println!("    ... and {} more", format_count(items.len() as u64 - 5));
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch {} listings with {} workers",
        format_count(items.len() as u64),
        config.crawler.max_workers.min(items.len().max(1))
    );

    Ok(())
}

/// Handles the --export-csv mode: flattens the results document into CSV tables
fn handle_export_csv(config: &Config) -> anyhow::Result<()> {
    let results_path = Path::new(&config.output.results_path);
    let summary_path = Path::new(&config.output.summary_csv_path);
    let detailed_path = Path::new(&config.output.detailed_csv_path);

    println!("🔄 Converting {} to CSV format...", results_path.display());
    println!("{}", "=".repeat(50));

    let snapshot = load_snapshot(results_path)
        .with_context(|| format!("Failed to read results document {}", results_path.display()))?;
    let counts = export_csv(&snapshot, summary_path, detailed_path)
        .context("Failed to write CSV export")?;

    println!("✓ Summary CSV created: {}", summary_path.display());
    println!(
        "  - {} group/volume combinations",
        format_count(counts.summary_rows)
    );
    println!("  - {} total files", format_count(counts.total_files));
    println!("  - {} total size", format_bytes(counts.total_bytes));
    println!("✓ Detailed CSV created: {}", detailed_path.display());
    println!(
        "  - {} individual file records",
        format_count(counts.detail_rows)
    );

    println!("\n✅ Conversion complete!");
    Ok(())
}

/// Handles the --count-groups mode
fn handle_count_groups(csv_path: &Path) -> anyhow::Result<()> {
    let groups = count_groups(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;
    println!("Number of distinct jurisdictions: {}", format_count(groups as u64));
    Ok(())
}

/// Handles the main census operation
async fn handle_census(config: Config) -> anyhow::Result<ExitCode> {
    let (_, _, items) = load_work_items(&config)?;
    tracing::info!(
        "Using {} parallel workers; press Ctrl-C to stop and save partial results",
        config.crawler.max_workers
    );

    let outcome = run_census(config, items).await.context("Census failed")?;
    print_report(&outcome.report, &outcome.stats);

    if outcome.is_complete() {
        tracing::info!(
            "Census started at {} completed successfully",
            outcome.started_at.to_rfc3339()
        );
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("Census interrupted; partial results were saved");
        Ok(ExitCode::from(EXIT_INTERRUPTED))
    }
}
