//! Character sheet tool.
//!
//! Loads a rule content directory and evaluates character files against it.
//! Run with: `sheet <command>`

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Check, Choices, Eval};
use config::SheetConfig;

/// Character sheet tool
#[derive(Parser)]
#[command(name = "sheet")]
#[command(about = "Evaluate characters against rule content", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Compute derived attributes and notes for a character file
    Eval(Eval),

    /// Validate a content directory and print its fingerprint
    Check(Check),

    /// List choice categories or the values of one category
    Choices(Choices),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for SHEET_CONTENT_DIR and friends)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SheetConfig::from_env();
    let cli = Cli::parse();

    match cli.command {
        Command::Eval(cmd) => cmd.execute(&config),
        Command::Check(cmd) => cmd.execute(&config),
        Command::Choices(cmd) => cmd.execute(&config),
    }
}
