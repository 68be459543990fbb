//! Transactional bulk insert with per-batch progress.
//!
//! The whole input is one transaction: batches only control how often progress
//! is reported. Any failure rolls everything back.

use roster_core::PersistableRecord;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::error::StoreError;
use crate::store::UserStore;

pub const DEFAULT_BATCH_SIZE: usize = roster_core::config::DEFAULT_BATCH_SIZE;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("failed to insert record {index}: {source}")]
    Insert {
        /// 1-based position in the input.
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] StoreError),
}

/// Reported once after each batch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadProgress {
    /// 1-based batch number.
    pub batch: usize,
    pub processed: usize,
    pub total: usize,
}

/// Insert every record in one transaction and return how many were inserted.
///
/// A `batch_size` of 0 is treated as 1.
pub async fn load_records<S, F>(
    store: &mut S,
    records: &[PersistableRecord],
    batch_size: usize,
    mut on_progress: F,
) -> Result<u64, LoadError>
where
    S: UserStore + ?Sized,
    F: FnMut(LoadProgress) + Send,
{
    let batch_size = batch_size.max(1);
    let total = records.len();

    info!("Processing and uploading {} records to database...", total);
    store.begin().await.map_err(LoadError::Begin)?;

    let mut processed = 0usize;
    for (batch_idx, batch) in records.chunks(batch_size).enumerate() {
        for record in batch {
            if let Err(source) = store.insert_user(record).await {
                let index = processed + 1;
                error!(index, error = %source, "Insert failed, rolling back");
                rollback_quietly(store).await;
                return Err(LoadError::Insert { index, source });
            }
            processed += 1;
        }

        info!("Processed {} of {} records", processed, total);
        on_progress(LoadProgress {
            batch: batch_idx + 1,
            processed,
            total,
        });
    }

    if let Err(e) = store.commit().await {
        error!(error = %e, "Commit failed, rolling back");
        rollback_quietly(store).await;
        return Err(LoadError::Commit(e));
    }

    info!("Database upload completed successfully");
    Ok(processed as u64)
}

/// Roll back after a failure. A rollback error is logged, never returned, so the
/// caller always sees the original failure.
async fn rollback_quietly<S: UserStore + ?Sized>(store: &mut S) {
    match store.rollback().await {
        Ok(()) => {}
        Err(StoreError::NoTransaction) => {}
        Err(e) => error!(error = %e, "Rollback failed"),
    }
}
