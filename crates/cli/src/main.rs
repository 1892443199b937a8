use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vecsync_core::{SyncMode, builtin_specs, env_parse_with_default};
use vecsync_pipeline::{RetryPolicy, SyncOptions, SyncRunner};
use vecsync_provider::{DEFAULT_EMBED_DIMENSIONS, DEFAULT_EMBED_MODEL, OpenAiEmbeddings};
use vecsync_storage::{PgRecordSource, RecordSource};

#[derive(Parser)]
#[command(name = "vecsync")]
#[command(about = "Keeps pgvector embedding columns in sync with their source rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed pending rows and write the vectors back
    Sync {
        /// fill-missing embeds rows without a vector, refresh-all re-embeds everything
        #[arg(short, long, default_value = "fill-missing")]
        mode: SyncMode,
        /// Comma-separated table names; all registered tables when omitted
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,
        /// Rows embedded concurrently within a table
        #[arg(short, long, default_value = "1")]
        concurrency: usize,
        /// Attempts per row when the provider fails transiently
        #[arg(long, default_value = "3")]
        retry_bound: u32,
        /// Count candidates without embedding or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the registered table specs
    Tables,
    /// Print embedding coverage per table
    Status,
}

fn get_database_url() -> Result<String> {
    std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))
}

fn get_api_key() -> Result<String> {
    std::env::var("OPENAI_API_KEY")
        .or_else(|_| std::env::var("VECSYNC_API_KEY"))
        .map_err(|_| {
            anyhow::anyhow!("OPENAI_API_KEY or VECSYNC_API_KEY environment variable must be set")
        })
}

fn get_base_url() -> String {
    std::env::var("VECSYNC_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string())
}

fn get_model() -> String {
    std::env::var("VECSYNC_EMBED_MODEL").unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string())
}

fn build_provider() -> Result<OpenAiEmbeddings> {
    let dimensions = env_parse_with_default("VECSYNC_EMBED_DIMENSIONS", DEFAULT_EMBED_DIMENSIONS);
    let timeout_secs = env_parse_with_default("VECSYNC_EMBED_TIMEOUT_SECS", 60_u64);
    Ok(OpenAiEmbeddings::new(
        get_api_key()?,
        get_base_url(),
        get_model(),
        dimensions,
        Duration::from_secs(timeout_secs),
    )?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let specs = builtin_specs();

    match cli.command {
        Commands::Sync { mode, tables, concurrency, retry_bound, dry_run } => {
            let source = PgRecordSource::connect(&get_database_url()?).await?;
            let provider = build_provider()?;
            let runner = SyncRunner::new(Arc::new(source), Arc::new(provider));

            let stop = runner.stop_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, letting in-flight rows finish");
                    stop.store(true, Ordering::SeqCst);
                }
            });

            let options = SyncOptions {
                mode,
                tables,
                concurrency,
                retry: RetryPolicy { max_attempts: retry_bound, ..RetryPolicy::default() },
                dry_run,
            };
            let report = runner.run(&specs, &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !report.is_success() {
                let aborted = report.tables.iter().filter(|t| t.fatal.is_some()).count();
                anyhow::bail!(
                    "sync incomplete: {} rows failed, {} tables aborted",
                    report.total_failed(),
                    aborted
                );
            }
        }
        Commands::Tables => {
            println!("{}", serde_json::to_string_pretty(&specs)?);
        }
        Commands::Status => {
            let source = PgRecordSource::connect(&get_database_url()?).await?;
            let mut coverage = serde_json::Map::new();
            for spec in &specs {
                let stats = source.embedding_stats(spec).await?;
                coverage.insert(spec.table.clone(), serde_json::to_value(stats)?);
            }
            println!("{}", serde_json::to_string_pretty(&coverage)?);
        }
    }

    Ok(())
}
