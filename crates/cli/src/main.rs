//! Delicious CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! dl-cli migrate
//!
//! # Load sample users, stores and reviews
//! dl-cli seed crates/cli/data/sample.yaml --clear
//!
//! # Show tag counts / top rated stores
//! dl-cli stats tags
//! dl-cli stats top
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dl-cli")]
#[command(author, version, about = "Delicious CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,

        /// Delete existing stores, reviews and users first
        #[arg(long)]
        clear: bool,
    },
    /// Show catalog statistics
    Stats {
        #[command(subcommand)]
        report: StatsReport,
    },
}

#[derive(Subcommand)]
enum StatsReport {
    /// Tag counts, most used first
    Tags,
    /// Top rated stores
    Top,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, clear } => {
            commands::seed::run(&file, clear).await?;
        }
        Commands::Stats { report } => match report {
            StatsReport::Tags => commands::stats::tags().await?,
            StatsReport::Top => commands::stats::top().await?,
        },
    }
    Ok(())
}
