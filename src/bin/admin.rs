//! CLI administration tool for shorter.
//!
//! Provides commands for viewing statistics, checking the database and
//! working with the base-62 code codec without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Encode a number as a short code and back
//! cargo run --bin admin -- codec encode 125
//! cargo run --bin admin -- codec decode 21
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`
//!   (required for `stats` and `db`)
//! - `DB_MAX_CONNECTIONS`, `STORE_TIMEOUT_MS` and the other pool settings apply

use shorter::application::services::StatsService;
use shorter::config::DatabaseConfig;
use shorter::server;
use shorter::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use shorter::utils::code_generator::{decode_numeric, encode_numeric};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shorter.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show system statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Base-62 code conversion
    Codec {
        #[command(subcommand)]
        action: CodecAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

/// Codec subcommands.
#[derive(Subcommand)]
enum CodecAction {
    /// Encode a non-negative integer as a short code
    Encode { value: u64 },

    /// Decode a short code into its integer value
    Decode { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats => handle_stats(&connect().await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await?,
        Commands::Codec { action } => handle_codec_action(action)?,
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let config = DatabaseConfig::from_env()?;
    config.validate()?;
    server::connect_pool(&config).await
}

/// Shows:
/// - Total number of links and clicks
/// - Links and clicks created today (UTC)
/// - Top destination hosts over the last 30 days
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let pool = Arc::new(pool.clone());
    let service = StatsService::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        Arc::new(PgClickRepository::new(pool)),
    );

    let stats = service
        .system_stats()
        .await
        .context("Failed to load statistics")?;

    println!(
        "  Links:         {} ({} today)",
        stats.total_links.to_string().bright_green().bold(),
        stats.links_today
    );
    println!(
        "  Clicks:        {} ({} today)",
        stats.total_clicks.to_string().bright_green().bold(),
        stats.clicks_today
    );

    if !stats.top_hosts.is_empty() {
        println!();
        println!("  {}", "Top destinations (30 days)".bright_white());
        for host in &stats.top_hosts {
            println!("    {:>6}  {}", host.count, host.label);
        }
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Converts between integers and base-62 codes.
fn handle_codec_action(action: CodecAction) -> Result<()> {
    match action {
        CodecAction::Encode { value } => {
            println!("{}", encode_numeric(value).bright_green().bold());
        }
        CodecAction::Decode { code } => {
            let value = decode_numeric(&code)
                .with_context(|| format!("Cannot decode '{}'", code))?;
            println!("{}", value.to_string().bright_green().bold());
        }
    }

    Ok(())
}
