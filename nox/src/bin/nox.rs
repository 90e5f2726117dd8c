//! NOX CLI - LLM-driven dark web investigations
//!
//! # Usage
//!
//! ```bash
//! # Models usable with the current credentials and local servers
//! nox models
//!
//! # How a name resolves
//! nox resolve llama3.2:latest
//!
//! # Full investigation
//! nox run -q "ransomware payments" -m claude-sonnet-4-5 -t 8 -o case-42
//!
//! # Configuration
//! nox config init
//! nox config show
//! ```

use clap::{Parser, Subcommand};
use nox::cli::commands::{
    self, config::ConfigCommand, models::ModelsArgs, resolve::ResolveArgs, run::RunArgs, Reported,
};
use nox::cli::{CliContext, OutputFormat, OutputFormatter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nox")]
#[command(version)]
#[command(about = "NOX - LLM-driven dark web investigation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (table, json, plain)
    #[arg(long, global = true, default_value = "table")]
    output_format: String,

    /// Suppress status messages
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an investigation and write the summary report
    Run(RunArgs),

    /// List available models
    Models(ModelsArgs),

    /// Show how a model name resolves
    Resolve(ResolveArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "nox=debug" } else { "nox=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(ctx: &mut CliContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => commands::run::execute(ctx, args).await,
        Commands::Models(args) => commands::models::execute(ctx, args).await,
        Commands::Resolve(args) => commands::resolve::execute(ctx, args).await,
        Commands::Config { command } => commands::config::execute(ctx, command).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output_format: OutputFormat = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using table format.", e);
        OutputFormat::Table
    });
    let formatter = OutputFormatter::new(output_format);

    let loaded = match cli.config {
        Some(path) => CliContext::new(path),
        None => CliContext::with_defaults(),
    };
    let mut ctx = match loaded {
        Ok(ctx) => ctx,
        Err(e) => {
            formatter.error(&format!("Error loading configuration: {}", e));
            std::process::exit(1);
        }
    };
    ctx.output_format = output_format;
    ctx.quiet = cli.quiet;
    ctx.verbose = cli.verbose;

    let result = tokio::select! {
        result = dispatch(&mut ctx, cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n\n[!] Operation cancelled by user. Exiting.");
            std::process::exit(0);
        }
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is::<Reported>() => std::process::exit(1),
        Err(e) => {
            formatter.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
