//! Corpsearch CLI
//!
//! Main entry point for the corpsearch command-line tool.
//! Semantic search over a corporate knowledge base.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AddCommand, ListCommand, SearchCommand, ShellCommand, StatsCommand};
use corpsearch_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Corpsearch - semantic search over corporate knowledge
#[derive(Parser, Debug)]
#[command(name = "corpsearch")]
#[command(about = "Semantic search over corporate knowledge", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CORPSEARCH_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CORPSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Document file to load (.jsonl, .json, .yaml, .csv)
    #[arg(long, global = true, env = "CORPSEARCH_DOCUMENTS")]
    documents: Option<PathBuf>,

    /// Embedding provider (trigram, ollama, mock)
    #[arg(short, long, global = true, env = "CORPSEARCH_PROVIDER")]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(short, long, global = true, env = "CORPSEARCH_MODEL")]
    model: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the knowledge base
    Search(SearchCommand),

    /// List all documents
    List(ListCommand),

    /// Add a document, optionally searching afterwards
    Add(AddCommand),

    /// Interactive search session
    Shell(ShellCommand),

    /// Show index and provider statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Environment and config file
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.documents,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Corpsearch CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider override: {:?}", config.provider);
    tracing::debug!("Model override: {:?}", config.model);

    let command_name = match &cli.command {
        Commands::Search(_) => "search",
        Commands::List(_) => "list",
        Commands::Add(_) => "add",
        Commands::Shell(_) => "shell",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::List(cmd) => cmd.execute(&config).await,
        Commands::Add(cmd) => cmd.execute(&config).await,
        Commands::Shell(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
