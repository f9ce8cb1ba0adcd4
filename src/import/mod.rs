pub mod commit;
pub mod dedupe;
pub mod fields;
pub mod headers;
pub mod reconcile;
pub mod report;
pub mod sheet;

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repo::{self, StoreError};

use self::dedupe::{Deduper, DuplicateVerdict};
use self::headers::HeaderMap;
pub use self::report::ImportOutcome;
pub use self::sheet::{FileKind, SheetError};

/// Failures that abort the whole import before anything is written. Per-row
/// problems never end up here; they are collected in the outcome instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Unreadable(#[from] SheetError),
    #[error(
        "no header row found in the first {} rows (need LAST NAME and FIRST NAME columns)",
        headers::HEADER_SCAN_ROWS
    )]
    HeaderNotFound,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Run one import: parse the upload, locate the header, reconcile and
/// de-duplicate every data row, then commit in chunks.
///
/// Always returns a complete [`ImportOutcome`] unless the file itself is
/// unreadable, no header row exists, or the store cannot be reached before
/// commit. A storage failure mid-commit is reported inside the outcome so
/// the counts for already-durable chunks survive.
pub async fn import_file(
    pool: &SqlitePool,
    bytes: &[u8],
    file_name: &str,
) -> Result<ImportOutcome, ImportError> {
    let run_id = Uuid::new_v4();
    info!(
        target = "balangay",
        event = "import_start",
        run_id = %run_id,
        file = %file_name,
        bytes = bytes.len()
    );

    let kind = FileKind::from_name(file_name);
    let sheet = sheet::load_sheet(bytes, kind)?;
    let headers = HeaderMap::locate(&sheet).ok_or(ImportError::HeaderNotFound)?;
    debug!(
        target = "balangay",
        event = "import_header_located",
        run_id = %run_id,
        header_row = headers.header_row + 1,
        columns = headers.labels().len()
    );

    let existing = repo::existing_identity_keys(pool).await?;
    let mut deduper = Deduper::new(existing);

    let mut outcome = ImportOutcome::default();
    let mut staged = Vec::new();
    let mut skipped_empty = 0usize;

    for row_idx in headers.first_data_row()..sheet.row_count() {
        let row_number = row_idx + 1;
        match reconcile::reconcile_row(&headers, &sheet, row_idx) {
            Ok(None) => skipped_empty += 1,
            Ok(Some(draft)) => match deduper.check(draft.identity()) {
                DuplicateVerdict::Fresh => staged.push(draft),
                DuplicateVerdict::InBatch | DuplicateVerdict::Persisted => {
                    debug!(
                        target = "balangay",
                        event = "duplicate_skip",
                        run_id = %run_id,
                        row = row_number
                    );
                    outcome.skipped_duplicates += 1;
                }
            },
            Err(err) => outcome.push_row_error(row_number, err),
        }
    }

    debug!(
        target = "balangay",
        event = "import_rows_reconciled",
        run_id = %run_id,
        staged = staged.len(),
        skipped_empty,
        skipped_duplicates = outcome.skipped_duplicates,
        row_errors = outcome.errors.len()
    );

    let summary = commit::commit_households(pool, &staged).await;
    outcome.added += summary.added;
    outcome.skipped_duplicates += summary.skipped_duplicates;
    if let Some(fatal) = summary.fatal {
        outcome.errors.push(fatal);
    }

    info!(
        target = "balangay",
        event = "import_complete",
        run_id = %run_id,
        added = outcome.added,
        skipped_duplicates = outcome.skipped_duplicates,
        errors = outcome.errors.len()
    );
    Ok(outcome)
}
