//! CLI for schema migrations and participant seeding
//!
//! Outputs JSON so scripts can parse the result.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use server_core::domains::participants::{actions::seed_participants, CreateParticipantRequest};
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Schema migration and seeding CLI for the check-in database")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Run,

    /// List known migrations and whether they are applied
    Status,

    /// Insert participants from a JSON array, skipping CPFs already present
    Seed {
        #[arg(long)]
        file: PathBuf,
    },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

#[derive(Serialize)]
struct MigrationInfo {
    version: i64,
    description: String,
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    installed_on: Option<DateTime<Utc>>,
}

fn output<T: Serialize>(resp: Response<T>) -> Result<()> {
    println!("{}", serde_json::to_string(&resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,server_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => cmd_run().await,
        Commands::Status => cmd_status().await,
        Commands::Seed { file } => cmd_seed(&file).await,
    }
}

/// Only the database is needed here, so the full server config is not loaded.
async fn get_pool() -> Result<PgPool> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_run() -> Result<()> {
    let pool = get_pool().await?;
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    output::<()>(Response {
        success: true,
        message: Some(format!("{} migrations applied", MIGRATOR.iter().count())),
        data: None,
    })
}

async fn cmd_status() -> Result<()> {
    let pool = get_pool().await?;

    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(&pool)
            .await?;

    let applied: HashMap<i64, DateTime<Utc>> = if table_exists {
        sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "SELECT version, installed_on FROM _sqlx_migrations WHERE success",
        )
        .fetch_all(&pool)
        .await?
        .into_iter()
        .collect()
    } else {
        HashMap::new()
    };

    let migrations: Vec<MigrationInfo> = MIGRATOR
        .iter()
        .map(|m| MigrationInfo {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains_key(&m.version),
            installed_on: applied.get(&m.version).copied(),
        })
        .collect();

    let pending = migrations.iter().filter(|m| !m.applied).count();
    output(Response {
        success: true,
        message: Some(format!("{} pending", pending)),
        data: Some(migrations),
    })
}

async fn cmd_seed(file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<CreateParticipantRequest> =
        serde_json::from_str(&raw).context("Seed file must be a JSON array of participants")?;

    let pool = get_pool().await?;
    let report = seed_participants(records, &pool)
        .await
        .context("Seeding failed")?;

    output(Response {
        success: report.invalid.is_empty(),
        message: None,
        data: Some(report),
    })
}
