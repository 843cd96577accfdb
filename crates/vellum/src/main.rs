//! Vellum CLI - Document rendering pipeline.
//!
//! Subcommands:
//! - `display`: Render a document's content as a JSON tree
//! - `title`: Print a document's resolved title
//! - `key`: Print the render key of a document

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{DisplayArgs, KeyArgs, TitleArgs};
use output::Output;

/// Vellum - Document rendering pipeline.
#[derive(Parser)]
#[command(name = "vellum", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover vellum.toml).
    #[arg(short, long, global = true, env = "VELLUM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (fallback warnings and cache activity).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the content of a document.
    Display(DisplayArgs),
    /// Resolve the title of a document.
    Title(TitleArgs),
    /// Print the render key of a document.
    Key(KeyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // RUST_LOG applies only without --verbose.
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Display(args) => args.execute(config, &output),
        Commands::Title(args) => args.execute(config, &output),
        Commands::Key(args) => args.execute(config, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
