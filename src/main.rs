//! rustpubsearch - Publication Searcher
//!
//! Queries the publication search service, prints the normalized result
//! table and optionally exports selected rows to CSV.
//!
//! ## Usage
//!
//! ```bash
//! rustpubsearch search --last-name Smith --last-name Jones --keyword cryo-EM \
//!     --start-date 2020-01-01 --sort title --export
//! rustpubsearch search --csv criteria.csv --select-all --export out.csv
//! rustpubsearch config show
//! rustpubsearch --api-base https://search.example.org config init
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rustpubsearch::{
    config::default_config_path, export::EXPORT_FILE_NAME, BatchFile, SearchClient, SearchConfig,
    SearchSession, SortField, SubmitOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Publication Searcher - query, sort, select and export research papers
#[derive(Parser)]
#[command(name = "rustpubsearch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Search service base URL (overrides config file and environment)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search publications and print the result table
    Search {
        /// Author last name (repeatable)
        #[arg(long = "last-name", short = 'n')]
        last_names: Vec<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Keyword (repeatable)
        #[arg(long = "keyword", short = 'k')]
        keywords: Vec<String>,

        /// Batch criteria CSV; switches to batch mode
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Column header clicks, applied in order (repeat a field to flip direction)
        #[arg(long = "sort", short = 's')]
        sort: Vec<SortField>,

        /// Select a paper by id (repeatable)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Press the Select All / Clear All control
        #[arg(long)]
        select_all: bool,

        /// Export to CSV (defaults to filtered_papers.csv)
        #[arg(long, num_args = 0..=1, default_missing_value = EXPORT_FILE_NAME)]
        export: Option<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show config file path
    Path,
    /// Show effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let config = SearchConfig::load()
        .context("Failed to load configuration")?
        .with_overrides(cli.api_base, cli.timeout);
    config.validate().context("Invalid configuration")?;
    let config = Arc::new(config);

    match cli.command {
        Commands::Search {
            last_names,
            start_date,
            end_date,
            keywords,
            csv,
            sort,
            select,
            select_all,
            export,
        } => {
            let options = SearchOptions {
                last_names,
                start_date,
                end_date,
                keywords,
                csv,
                sort,
                select,
                select_all,
                export,
            };
            run_search(config, options).await
        }
        Commands::Config { action } => handle_config(action, &config),
    }
}

// ============================================================================
// Search
// ============================================================================

struct SearchOptions {
    last_names: Vec<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    keywords: Vec<String>,
    csv: Option<PathBuf>,
    sort: Vec<SortField>,
    select: Vec<String>,
    select_all: bool,
    export: Option<PathBuf>,
}

async fn run_search(config: Arc<SearchConfig>, options: SearchOptions) -> Result<()> {
    let client = SearchClient::new(Arc::clone(&config))?;
    let mut session = SearchSession::new(config);

    for name in &options.last_names {
        session.filters.last_names.add(name);
    }
    for keyword in &options.keywords {
        session.filters.keywords.add(keyword);
    }
    session.filters.start_date = checked_date(options.start_date, "--start-date")?;
    session.filters.end_date = checked_date(options.end_date, "--end-date")?;
    if let Some(path) = &options.csv {
        let file = BatchFile::from_path(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        session.filters.batch_file = Some(file);
    }

    println!("Searching…");
    match session.submit(&client).await {
        SubmitOutcome::Applied(count) => info!(count = count, "Search complete"),
        SubmitOutcome::Discarded => {}
        SubmitOutcome::Failed(message) => anyhow::bail!("{}", message),
    }

    for field in options.sort {
        session.toggle_sort(field);
    }
    for id in &options.select {
        session.toggle_selection(id, true);
    }
    if options.select_all {
        session.toggle_select_all();
    }

    if let Some(status) = session.status_line() {
        println!("{}", status);
    }
    println!("{}", session.render_table());

    if let Some(path) = options.export {
        if session.papers().is_empty() {
            println!("Nothing to export.");
        } else {
            let rows = session
                .export_to(&path)
                .with_context(|| format!("Failed to export to {}", path.display()))?;
            println!("Saved {} papers to {}", rows, path.display());
        }
    }

    Ok(())
}

/// Pass dates through unchanged, but catch obvious typos early
fn checked_date(value: Option<String>, flag: &str) -> Result<String> {
    let value = value.unwrap_or_default();
    if !value.is_empty() {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .with_context(|| format!("{} must be YYYY-MM-DD, got '{}'", flag, value))?;
    }
    Ok(value)
}

// ============================================================================
// Config
// ============================================================================

fn handle_config(action: ConfigAction, config: &SearchConfig) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("Config file: {:?}", default_config_path()?);
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigAction::Init { force } => {
            let path = default_config_path()?;
            if path.exists() && !force {
                anyhow::bail!("Config file already exists at {:?} (use --force to overwrite)", path);
            }
            config.save(&path).context("Failed to write config file")?;
            println!("Wrote config to {:?}", path);
        }
    }
    Ok(())
}
