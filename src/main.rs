//! Kite CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "kite")]
#[command(about = "Index a repository into files, symbols and a module dependency graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the file inventory
    Tree,
    /// Print the symbols of one file
    Symbols {
        /// Path relative to the repository root
        file: String,
    },
    /// Print the file inventory with symbols for every supported file
    Map,
    /// Show dependencies (or dependents) of a module
    Deps {
        module: String,

        /// Follow edges transitively
        #[arg(long)]
        indirect: bool,

        /// List modules depending on MODULE instead
        #[arg(long)]
        dependents: bool,
    },
    /// Show dependency details for one source file
    FileDeps { file: String },
    /// List import cycles between internal modules
    Cycles,
    /// Export the dependency graph
    Export {
        /// json, dot, graphml or adjacency
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarize the dependency graph
    Report {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Regex search across the repository
    Search {
        query: String,

        /// Glob on file names, e.g. "*.py"
        #[arg(short, long)]
        pattern: Option<String>,

        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Lines of context around each match
        #[arg(short = 'C', long, default_value = "0")]
        context: usize,
    },
    /// Find definitions and references of a symbol
    Usages {
        name: String,

        /// Restrict definitions to this symbol type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kite={}", log_level)));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Kite v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Repository root: {}", cli.root.display());

    match cli.command {
        Commands::Tree => commands::tree(&cli.root),
        Commands::Symbols { file } => commands::symbols(&cli.root, &file),
        Commands::Map => commands::map(&cli.root),
        Commands::Deps {
            module,
            indirect,
            dependents,
        } => commands::deps(&cli.root, &module, indirect, dependents),
        Commands::FileDeps { file } => commands::file_deps(&cli.root, &file),
        Commands::Cycles => commands::cycles(&cli.root),
        Commands::Export { format, output } => commands::export(&cli.root, &format, output.as_deref()),
        Commands::Report { output } => commands::report(&cli.root, output.as_deref()),
        Commands::Search {
            query,
            pattern,
            ignore_case,
            context,
        } => commands::search(&cli.root, &query, pattern, ignore_case, context),
        Commands::Usages { name, kind } => commands::usages(&cli.root, &name, kind.as_deref()),
        Commands::Version => {
            println!("Kite v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
