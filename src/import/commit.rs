use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::model::HouseholdDraft;
use crate::repo::{self, StoreError};

/// Households committed per transaction. Chunking keeps a mid-batch storage
/// failure from discarding progress that is already durable.
pub const COMMIT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Default)]
pub struct CommitSummary {
    pub added: u64,
    pub skipped_duplicates: u64,
    /// Set when a chunk failed; everything before it stayed committed.
    pub fatal: Option<String>,
}

/// Persist the staged households chunk by chunk.
///
/// A duplicate discovered only at commit time (e.g. a concurrent import won
/// the race) downgrades to a skip; any other storage error rolls back the
/// current chunk and aborts the remainder.
pub async fn commit_households(pool: &SqlitePool, drafts: &[HouseholdDraft]) -> CommitSummary {
    let mut summary = CommitSummary::default();

    for chunk in drafts.chunks(COMMIT_CHUNK_SIZE) {
        match commit_chunk(pool, chunk).await {
            Ok((added, skipped)) => {
                summary.added += added;
                summary.skipped_duplicates += skipped;
            }
            Err(err) => {
                error!(
                    target = "balangay",
                    event = "commit_chunk_failed",
                    committed = summary.added,
                    error = %err
                );
                summary.fatal = Some(format!("import aborted during commit: {err}"));
                break;
            }
        }
    }

    summary
}

async fn commit_chunk(
    pool: &SqlitePool,
    chunk: &[HouseholdDraft],
) -> Result<(u64, u64), StoreError> {
    let mut tx = pool.begin().await.map_err(StoreError::from)?;
    let mut added = 0;
    let mut skipped = 0;

    for draft in chunk {
        match repo::insert_household(&mut *tx, draft).await? {
            Some(_) => added += 1,
            None => {
                debug!(
                    target = "balangay",
                    event = "commit_duplicate_skip",
                    row = draft.source_row
                );
                skipped += 1;
            }
        }
    }

    tx.commit().await.map_err(StoreError::from)?;
    Ok((added, skipped))
}
