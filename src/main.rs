//! Exam-Harvest main entry point
//!
//! This is the command-line interface for the Exam-Harvest question harvester.

use anyhow::{bail, Context};
use clap::Parser;
use exam_harvest::config::{load_config_with_hash, Config};
use exam_harvest::crawler::{Coordinator, ExamCatalog};
use exam_harvest::output::{
    default_output_path, print_crawl_summary, print_providers, ExamLabel, JsonRenderer, Renderer,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How often crawl progress is logged
const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Exam-Harvest: an exam-discussion question harvester
///
/// Exam-Harvest lists providers and exams of an exam-discussion site and
/// harvests every question of a selected exam, with its answers, exhibits
/// and discussion comments, into a JSON document.
#[derive(Parser, Debug)]
#[command(name = "exam-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An exam-discussion question harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// List every provider and exit
    #[arg(long, conflicts_with_all = ["list_exams", "provider"])]
    list_providers: bool,

    /// List the exams of one provider and exit
    #[arg(long, value_name = "PROVIDER", conflicts_with = "provider")]
    list_exams: Option<String>,

    /// Provider to harvest
    #[arg(short, long)]
    provider: Option<String>,

    /// Exam to harvest; omit to harvest every discussion of the provider
    #[arg(short, long, requires = "provider")]
    exam: Option<String>,

    /// Output file (defaults to <provider>_<exam>.json)
    #[arg(short, long, value_name = "FILE", requires = "provider")]
    output: Option<PathBuf>,

    /// Ignore cached exam lists for the selected provider
    #[arg(long)]
    refresh_cache: bool,

    /// Log per-request diagnostics
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.debug);

    let mut config = load_configuration(cli.config.as_deref())?;
    config.debug |= cli.debug;

    let coordinator = Coordinator::new(config).context("Failed to initialize crawler")?;

    if cli.list_providers {
        handle_list_providers(&coordinator).await
    } else if let Some(provider) = &cli.list_exams {
        if cli.refresh_cache {
            coordinator.refresh_cache(provider).await;
        }
        handle_list_exams(&coordinator, provider).await
    } else if let Some(provider) = &cli.provider {
        if cli.refresh_cache {
            coordinator.refresh_cache(provider).await;
        }
        handle_crawl(
            &coordinator,
            provider,
            cli.exam.as_deref().unwrap_or(""),
            cli.output,
        )
        .await
    } else {
        bail!("Nothing to do: pass --list-providers, --list-exams <PROVIDER> or --provider <PROVIDER>");
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match (verbose, debug) {
            (0, false) => EnvFilter::new("exam_harvest=info,warn"),
            (0, true) | (1, _) => EnvFilter::new("exam_harvest=debug,info"),
            (2, _) => EnvFilter::new("exam_harvest=trace,debug"),
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

/// Loads the configuration file, or the defaults when none is given
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given; using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles --list-providers
async fn handle_list_providers(coordinator: &Coordinator) -> anyhow::Result<()> {
    let providers = coordinator.discover_providers().await?;
    print_providers(&providers);
    Ok(())
}

/// Handles --list-exams
async fn handle_list_exams(coordinator: &Coordinator, provider: &str) -> anyhow::Result<()> {
    match coordinator.discover_exam_slugs(provider).await? {
        ExamCatalog::Exams(exams) => {
            for exam in &exams {
                println!("{}", exam);
            }
            println!();
            println!("{} exams", exams.len());
        }
        catalog @ ExamCatalog::AllDiscussions => {
            println!("No exams identified; use --provider {} without --exam", provider);
            for selection in catalog.selections() {
                println!("{}", selection);
            }
        }
    }
    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(
    coordinator: &Coordinator,
    provider: &str,
    exam: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let progress = coordinator.progress();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROGRESS_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::info!("Progress: {} units completed", progress.completed());
        }
    });

    let result = coordinator.crawl_exam(provider, exam).await;
    ticker.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_crawl_summary(&outcome);

    if outcome.records.is_empty() {
        tracing::warn!("No questions harvested; nothing written");
        return Ok(());
    }

    let label = ExamLabel::new(&outcome.provider, &outcome.selection);
    let path = output.unwrap_or_else(|| default_output_path(&label.provider, &label.exam, "json"));
    let renderer = JsonRenderer::new(&path);
    renderer
        .render(&label, &outcome.records)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("\n✓ {} written to: {}", label.title(), path.display());
    Ok(())
}
