//! CLI argument parsing and subcommand dispatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use roster_core::Config;
use roster_storage::{calculate_distribution, render_report, MemoryUserStore, PgUserStore};
use tracing::info;

use crate::{db, pipeline};

/// Roster: load a users CSV into PostgreSQL and report the age distribution.
#[derive(Parser, Debug)]
#[command(name = "roster-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,

    /// Process a CSV file once and print the age distribution.
    Process {
        /// CSV file to load instead of CSV_FILE_PATH.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Parse and transform into an in-memory store; PostgreSQL is not touched.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the age distribution of the users already in the database.
    Report,
}

/// Dispatch a parsed command line.
///
/// Returns `Ok(true)` if a subcommand was handled, `Ok(false)` if `serve`
/// should be started (handled by the caller).
pub async fn dispatch(config: &Config, cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        None | Some(Command::Serve) => Ok(false),
        Some(Command::Process { file, dry_run }) => {
            let mut ingest = config.ingest.clone();
            if let Some(path) = file {
                ingest.csv_file_path = path.clone();
            }

            let outcome = if *dry_run {
                info!("Dry run: records are loaded into memory only");
                let mut store = MemoryUserStore::new();
                pipeline::process_with_store(&mut store, &ingest).await?
            } else {
                let pool = db::init_pg_pool(&config.postgres).await?;
                pipeline::process_with_pool(&pool, &ingest).await?
            };

            println!("{}", render_report(&outcome.distribution));
            println!(
                "{} records inserted, {} rows skipped (run {})",
                outcome.records_inserted, outcome.rows_skipped, outcome.run_id
            );
            Ok(true)
        }
        Some(Command::Report) => {
            let pool = db::init_pg_pool(&config.postgres).await?;
            let mut store = PgUserStore::acquire(&pool).await?;
            let report = calculate_distribution(&mut store).await?;
            println!("{}", render_report(&report));
            Ok(true)
        }
    }
}
