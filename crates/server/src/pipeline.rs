//! One run of "process the configured file": parse, transform, load, report.
//!
//! Parse and transform failures happen before any connection is taken, so they
//! never touch the database. A load failure rolls the whole file back. An
//! aggregation failure happens after commit and is reported as its own state.

use std::future::Future;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use roster_core::config::IngestConfig;
use roster_core::PersistableRecord;
use roster_ingest::{build_nested, normalize_all, NormalizeError, ParseError, RecordParser, SkippedRow};
use roster_storage::{
    calculate_distribution, load_records, render_report, AggregateError, DistributionReport,
    LoadError, PgUserStore, StoreError, UserStore,
};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("parser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("database connection unavailable: {0}")]
    Connection(#[source] StoreError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{inserted} records were committed but the age distribution failed: {source}")]
    Aggregation {
        inserted: u64,
        #[source]
        source: AggregateError,
    },
}

impl PipelineError {
    /// Stable, stage-level message for API consumers.
    pub fn message(&self) -> &'static str {
        match self {
            PipelineError::Parse(_) | PipelineError::Normalize(_) | PipelineError::Task(_) => {
                "Error processing CSV file"
            }
            PipelineError::Connection(_) | PipelineError::Load(_) => {
                "Error uploading records to database"
            }
            PipelineError::Aggregation { .. } => "CSV uploaded but age distribution failed",
        }
    }

    /// Rows that are durably committed despite the failure.
    pub fn records_inserted(&self) -> Option<u64> {
        match self {
            PipelineError::Aggregation { inserted, .. } => Some(*inserted),
            _ => None,
        }
    }
}

/// Records ready for loading, plus what the parser dropped.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub records: Vec<PersistableRecord>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub run_id: Uuid,
    pub records_inserted: u64,
    pub rows_skipped: usize,
    pub batches: usize,
    pub distribution: DistributionReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Parse and transform a file. Blocking; see [`prepare_blocking`].
pub fn prepare(path: &std::path::Path, parser: RecordParser) -> Result<PreparedFile, PipelineError> {
    let parsed = parser.parse_file(path)?;
    let structured: Vec<_> = parsed.records.iter().map(build_nested).collect();
    let records = normalize_all(&structured)?;
    Ok(PreparedFile {
        records,
        skipped: parsed.skipped,
    })
}

pub async fn prepare_blocking(path: PathBuf, parser: RecordParser) -> Result<PreparedFile, PipelineError> {
    tokio::task::spawn_blocking(move || prepare(&path, parser)).await?
}

/// Run against PostgreSQL. One connection is held from load through aggregation.
pub async fn process_with_pool(pool: &PgPool, ingest: &IngestConfig) -> Result<ProcessOutcome, PipelineError> {
    let batch_size = ingest.batch_size;
    run(ingest, move |prepared, run_id, started_at| async move {
        let mut store = PgUserStore::acquire(pool)
            .await
            .map_err(PipelineError::Connection)?;
        finish(&mut store, prepared, batch_size, run_id, started_at).await
    })
    .await
}

/// Run against a caller-provided store (dry runs, tests).
pub async fn process_with_store<S>(store: &mut S, ingest: &IngestConfig) -> Result<ProcessOutcome, PipelineError>
where
    S: UserStore + ?Sized,
{
    let batch_size = ingest.batch_size;
    run(ingest, move |prepared, run_id, started_at| async move {
        finish(store, prepared, batch_size, run_id, started_at).await
    })
    .await
}

/// Shared run frame: id, span, prepare, then hand the records to `load`.
async fn run<F, Fut>(ingest: &IngestConfig, load: F) -> Result<ProcessOutcome, PipelineError>
where
    F: FnOnce(PreparedFile, Uuid, DateTime<Utc>) -> Fut,
    Fut: Future<Output = Result<ProcessOutcome, PipelineError>>,
{
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("process_csv", run_id = %run_id);

    async move {
        info!("Starting CSV processing...");
        let prepared = prepare_blocking(ingest.csv_file_path.clone(), parser_for(ingest)).await?;
        load(prepared, run_id, started_at).await
    }
    .instrument(span)
    .await
    .inspect_err(|e| error!(run_id = %run_id, error = %e, "CSV processing failed"))
}

fn parser_for(ingest: &IngestConfig) -> RecordParser {
    RecordParser::with_delimiter(ingest.delimiter)
}

async fn finish<S>(
    store: &mut S,
    prepared: PreparedFile,
    batch_size: usize,
    run_id: Uuid,
    started_at: DateTime<Utc>,
) -> Result<ProcessOutcome, PipelineError>
where
    S: UserStore + ?Sized,
{
    let mut batches = 0usize;
    let inserted = load_records(store, &prepared.records, batch_size, |_| batches += 1).await?;

    let distribution = calculate_distribution(store)
        .await
        .map_err(|source| PipelineError::Aggregation { inserted, source })?;
    info!("\n{}", render_report(&distribution));

    Ok(ProcessOutcome {
        run_id,
        records_inserted: inserted,
        rows_skipped: prepared.skipped.len(),
        batches,
        distribution,
        started_at,
        finished_at: Utc::now(),
    })
}
