use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use literank::config::{find_config_file, load_config, Config};
use literank::embedding::{Embedder, LazyEmbedder};
use literank::models::SearchResult;
use literank::ui::{self, Spinner, Status};
use literank::{Orchestrator, SourceRegistry};
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// literank - Search biomedical literature and rank it by semantic similarity
#[derive(Parser, Debug)]
#[command(name = "literank")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search PubMed, Europe PMC, arXiv and PubMed Central and rank results by semantic similarity", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides http.timeout_secs)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Maximum results per source (overrides sources.max_results)
    #[arg(long, short, global = true)]
    max_results: Option<usize>,

    /// Comma-separated sources to query (pubmed,europe_pmc,arxiv,pmc)
    #[arg(long, short, global = true, value_delimiter = ',')]
    sources: Option<Vec<String>>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text blocks
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one search and print the ranked articles
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Prompt for queries until `:q` or end of input (the default)
    #[command(alias = "i")]
    Interactive,

    /// List the configured sources
    Sources,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Search { query } => {
            let orchestrator = build_orchestrator(&config)?;
            let result = run_search(&orchestrator, &query.join(" "), cli.output, cli.quiet).await?;
            render(&result, cli.output)?;
        }

        Commands::Interactive => {
            let orchestrator = build_orchestrator(&config)?;
            interactive(&orchestrator, cli.output, cli.quiet).await?;
        }

        Commands::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            let endpoints = &config.sources.endpoints;
            for source in registry.all() {
                let endpoint = match source.id() {
                    "europe_pmc" => &endpoints.europe_pmc_search_url,
                    "arxiv" => &endpoints.arxiv_query_url,
                    _ => &endpoints.eutils_base_url,
                };
                println!(
                    "{} {:<16} {:<11} {}",
                    ui::source_icon(source.kind()),
                    source.name(),
                    source.id(),
                    endpoint
                );
            }
        }

        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Install the tracing subscriber; logs go to stderr
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("literank={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from file if specified or found, then apply CLI overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }

    let mut config = load_config(path.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if let Some(max_results) = cli.max_results {
        config.sources.max_results = max_results;
    }
    if let Some(sources) = &cli.sources {
        config.sources.enabled = sources.clone();
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let embedder: Arc<dyn Embedder> = Arc::new(LazyEmbedder::bert(config.embedding.clone()));
    Ok(Orchestrator::from_config(config, embedder)?)
}

async fn run_search(
    orchestrator: &Orchestrator,
    query: &str,
    format: OutputFormat,
    quiet: bool,
) -> Result<SearchResult> {
    let show_spinner = !quiet && format.resolve() != OutputFormat::Json && ui::stderr_is_terminal();
    let spinner = show_spinner.then(|| Spinner::new("Searching and ranking..."));

    let start = Instant::now();
    let outcome = orchestrator.search(query).await;

    match (&outcome, &spinner) {
        (Ok(result), Some(spinner)) => spinner.finish_with_success(&format!(
            "Ranked {} articles in {:.2}s",
            result.len(),
            start.elapsed().as_secs_f64()
        )),
        (Err(e), Some(spinner)) => spinner.finish_with_error(&e.to_string()),
        _ => {}
    }

    let result = outcome?;
    if !quiet {
        ui::print_source_failures(&result);
    }
    Ok(result)
}

fn render(result: &SearchResult, format: OutputFormat) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Plain => ui::print_results_plain(result),
        OutputFormat::Table | OutputFormat::Auto => {
            if result.is_empty() {
                println!("No articles found.");
            } else {
                println!("{}", ui::results_table(result, ui::terminal_width()));
            }
        }
    }
    Ok(())
}

/// Run `work` to completion unless `interrupt` resolves first
///
/// `interrupt` is borrowed pinned so one listener spans the whole session;
/// a signal that lands between two calls is seen by the next one.
async fn unless_interrupted<T, I>(work: impl Future<Output = T>, interrupt: Pin<&mut I>) -> Option<T>
where
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => None,
    }
}

/// Read queries from stdin until `:q`, end of input, or Ctrl-C
async fn interactive(orchestrator: &Orchestrator, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    if !quiet {
        ui::print_section("literank");
        println!("Enter a query to search, or :q to quit.");
    }

    loop {
        print!("{} Search articles: ", ui::status_icon(Status::Search));
        std::io::stdout().flush()?;

        let Some(line) = unless_interrupted(lines.next_line(), interrupt.as_mut()).await else {
            println!();
            break;
        };
        let Some(line) = line? else {
            println!();
            break;
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, ":q" | ":quit" | "exit") {
            break;
        }

        let search = run_search(orchestrator, query, format, quiet);
        let Some(outcome) = unless_interrupted(search, interrupt.as_mut()).await else {
            ui::print_status(Status::Warning, "Search interrupted");
            break;
        };

        match outcome {
            Ok(result) => render(&result, format)?,
            Err(e) => ui::print_status(Status::Error, &format!("Search failed: {:#}", e)),
        }
        ui::print_divider();
    }

    Ok(())
}
