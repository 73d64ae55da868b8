use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roof_data::CatalogLoader;
use roof_db_sqlite::SqliteRepository;

/// Load the product catalog from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - slug: Unique product key (lowercase letters, digits, underscores)
/// - name: Display name
/// - description: Free text (may be empty)
/// - unit: `sqft` for per-square-foot pricing or `flat` for a fixed charge
/// - price: Unit price (e.g., 4.50)
/// - active: true/false (empty means true)
///
/// Rows whose slug already exists update that product; the rest are created.
#[derive(Parser, Debug)]
#[command(name = "roof-catalog-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing catalog data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:roof.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:roof.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading catalog from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = CatalogLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let summary = CatalogLoader::load(&repo, &records)
        .await
        .context("Failed to load catalog into database")?;

    println!(
        "Catalog loaded: {} created, {} updated.",
        summary.created, summary.updated
    );

    Ok(())
}
