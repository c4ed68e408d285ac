//! # shelf-cli
//!
//! Command-line entry point for the Shelf catalog loader.
//!
//! Loads connection settings from an env file, creates the database
//! schema when missing, and bulk-imports a books CSV export.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use shelf_csv::{ChunkedReader, ReaderOptions};
use shelf_db::{DbConnection, connection_config_from_env_file, initialize};
use shelf_import::{ImportStats, Importer};

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Import a books CSV export into the catalog database")]
#[command(version)]
struct Cli {
    /// Path to the env file with connection settings
    #[arg(short, long, default_value = "./.env")]
    config: PathBuf,

    /// Path to the books CSV file
    #[arg(short, long, default_value = "./data/clean_data/books.csv")]
    input: PathBuf,

    /// Records per import chunk
    #[arg(long, default_value_t = shelf_csv::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !cli.input.is_file() {
        anyhow::bail!("input file not found: {}", cli.input.display());
    }

    let config = connection_config_from_env_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    let connection = DbConnection::with_config(config);
    connection
        .connect()
        .await
        .context("failed to open database")?;
    tracing::info!(input = %cli.input.display(), chunk_size = cli.chunk_size, "import starting");

    let outcome = run_import(&connection, &cli).await;

    // The connection is closed on every path, success or not.
    connection.close().await;

    let stats = outcome?;
    tracing::info!(imported = stats.imported, failed = stats.failed, "import complete");
    println!(
        "imported {} of {} records ({} failed, {} links) in {:.1}s ({:.0} records/s)",
        stats.imported,
        stats.received,
        stats.failed,
        stats.links_written,
        stats.elapsed().as_secs_f64(),
        stats.rate(),
    );

    Ok(())
}

async fn run_import(connection: &DbConnection, cli: &Cli) -> anyhow::Result<ImportStats> {
    initialize(connection)
        .await
        .context("failed to create schema")?;

    let options = ReaderOptions::new().chunk_size(cli.chunk_size);
    let mut source = ChunkedReader::open(&cli.input, &options)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;

    let importer = Importer::new(connection.clone());
    let stats = importer.run(&mut source).await.context("import failed")?;
    Ok(stats)
}
