#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "import", about = "Balangay resident masterlist importer")]
struct Cli {
    /// SQLite database path (created and migrated if missing)
    #[arg(long, value_name = "PATH", default_value = "balangay.sqlite3")]
    db: PathBuf,

    /// Spreadsheet to import (.xlsx, .xls, or .csv)
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    balangay::logging::init();
    let cli = Cli::parse();

    let pool = balangay::db::open_sqlite_pool(&cli.db).await?;
    balangay::migrate::apply_migrations(&pool).await?;

    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("read {}", cli.file.display()))?;
    let name = cli
        .file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");

    let outcome = balangay::import_file(&pool, &bytes, name).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
