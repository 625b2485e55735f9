//! Bulk member import
//!
//! Turns a batch of untyped rows into stored members and a per-row
//! disposition. The pipeline runs in three stages:
//!
//! 1. **Candidates** - every row is normalized into an [`ImportCandidate`]
//!    carrying its index, source row number, trimmed name and canonical DNI.
//! 2. **Partition** - [`partition`] rejects invalid rows and repeated DNIs
//!    within the batch (first occurrence wins).
//! 3. **Reconcile** - [`BulkImporter::reconcile`] pre-checks the store, then
//!    inserts the survivors in chunks and resolves every ambiguous chunk by
//!    re-querying the store.
//!
//! Every row ends up in exactly one of `inserted` or `failures`.
//!
//! # Examples
//!
//! ```no_run
//! use clubgate_core::MemberRow;
//! use clubgate_storage::import::BulkImporter;
//! use clubgate_storage::repositories::InMemoryMemberRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let importer = BulkImporter::new(InMemoryMemberRepository::new());
//! let rows = vec![
//!     MemberRow::new("Alice", "123"),
//!     MemberRow::new("Bob", "123"),
//!     MemberRow::new("Charlie", "456"),
//! ];
//!
//! let result = importer.import_rows(&rows).await?;
//! assert_eq!(result.inserted.len(), 2);
//! assert_eq!(result.failures[0].message, "DNI duplicado en archivo");
//! # Ok(())
//! # }
//! ```

use crate::error::StorageResult;
use crate::messages::DisplayMessages;
use crate::models::NewMember;
use crate::repositories::{BulkInsertReport, InsertOutcome, MemberRepository, WriteErrorKind};
use clubgate_core::constants::{DEFAULT_IMPORT_CHUNK_SIZE, HEADER_ROW_OFFSET};
use clubgate_core::dni;
use clubgate_core::row::{MemberRow, RowRecord};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Why a row was not imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// Name or DNI missing
    InvalidRow,
    /// DNI repeated earlier in the same batch
    DuplicateInBatch,
    /// DNI already stored
    DuplicateInStore,
    /// Row absent after an ambiguous bulk insert
    InsertConflict,
    /// Any other store failure
    Store,
}

/// A member stored by the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedMember {
    pub dni: String,
    pub full_name: String,
}

/// A row that was not imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    /// 0-based position in the submitted batch
    pub index: usize,
    /// 1-based row number in the source sheet
    pub row_number: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Spanish, user-facing
    pub message: String,
    pub kind: FailureKind,
}

/// Outcome of a bulk import
///
/// Both lists keep the relative input order of their rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkImportResult {
    pub inserted: Vec<InsertedMember>,
    pub failures: Vec<ImportFailure>,
}

impl BulkImportResult {
    /// Number of rows accounted for
    pub fn len(&self) -> usize {
        self.inserted.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Failures of one kind
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &ImportFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    fn merge(&mut self, other: BulkImportResult) {
        self.inserted.extend(other.inserted);
        self.failures.extend(other.failures);
    }
}

/// A normalized row on its way into the store
#[derive(Debug, Clone, PartialEq)]
pub struct ImportCandidate {
    pub original_index: usize,
    pub row_number: usize,
    pub raw_dni: Value,
    pub full_name: String,
    pub normalized_dni: String,
}

impl ImportCandidate {
    /// Normalize the row found at `index` of the batch.
    ///
    /// Without an explicit row number the row is assumed to sit below a
    /// single header line, so index 0 is row 2.
    pub fn from_row(index: usize, row: &MemberRow) -> Self {
        Self {
            original_index: index,
            row_number: row.row_number.unwrap_or(index + HEADER_ROW_OFFSET),
            raw_dni: row.dni.clone(),
            full_name: row.full_name_text(),
            normalized_dni: dni::normalize(&row.dni),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.normalized_dni.is_empty() && !self.full_name.is_empty()
    }

    fn failure(&self, kind: FailureKind, message: impl Into<String>) -> ImportFailure {
        ImportFailure {
            index: self.original_index,
            row_number: self.row_number,
            dni: Some(self.normalized_dni.clone()).filter(|d| !d.is_empty()),
            full_name: Some(self.full_name.clone()).filter(|n| !n.is_empty()),
            message: message.into(),
            kind,
        }
    }

    fn inserted(&self) -> InsertedMember {
        InsertedMember {
            dni: self.normalized_dni.clone(),
            full_name: self.full_name.clone(),
        }
    }

    fn new_member(&self) -> NewMember {
        NewMember::new(self.full_name.clone(), self.normalized_dni.clone())
    }
}

/// Normalize every row of a batch, keeping input order.
pub fn build_candidates(rows: &[MemberRow]) -> Vec<ImportCandidate> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| ImportCandidate::from_row(index, row))
        .collect()
}

/// Candidates split by [`partition`]
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub unique: Vec<ImportCandidate>,
    pub rejected: Vec<ImportFailure>,
}

/// Reject invalid rows and in-batch duplicates.
///
/// Invalid rows are dropped before counting, so they never shadow a valid
/// row with the same DNI. Of the valid rows sharing a DNI, the first in
/// input order survives.
pub fn partition(candidates: Vec<ImportCandidate>) -> Partition {
    let mut seen = HashSet::new();
    let mut result = Partition::default();

    for candidate in candidates {
        if !candidate.is_valid() {
            result
                .rejected
                .push(candidate.failure(FailureKind::InvalidRow, DisplayMessages::INVALID_ROW));
        } else if seen.insert(candidate.normalized_dni.clone()) {
            result.unique.push(candidate);
        } else {
            result.rejected.push(
                candidate.failure(FailureKind::DuplicateInBatch, DisplayMessages::DUPLICATE_IN_FILE),
            );
        }
    }

    result
}

/// Runs bulk imports against a member store
pub struct BulkImporter<R> {
    repo: R,
    chunk_size: usize,
}

impl<R: MemberRepository> BulkImporter<R> {
    /// Create an importer with the default chunk size
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
        }
    }

    /// Set the number of documents per bulk insert (minimum 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Underlying store
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Import rows resolved from untyped records.
    pub async fn import_records(&self, records: &[RowRecord]) -> StorageResult<BulkImportResult> {
        let rows: Vec<MemberRow> = records.iter().map(MemberRow::from_record).collect();
        self.import_rows(&rows).await
    }

    /// Import a batch of rows.
    ///
    /// # Errors
    ///
    /// Only a failing pre-check lookup aborts the call. Per-row and
    /// per-chunk failures are reported in the result.
    pub async fn import_rows(&self, rows: &[MemberRow]) -> StorageResult<BulkImportResult> {
        if rows.is_empty() {
            return Ok(BulkImportResult::default());
        }

        let Partition { unique, rejected } = partition(build_candidates(rows));
        debug!(
            rows = rows.len(),
            unique = unique.len(),
            rejected = rejected.len(),
            "Partitioned import batch"
        );

        let mut result = BulkImportResult {
            inserted: Vec::new(),
            failures: rejected,
        };
        result.merge(self.reconcile(unique).await?);
        result.failures.sort_by_key(|f| f.index);

        debug_assert_eq!(result.len(), rows.len(), "every row must be accounted for");

        info!(
            rows = rows.len(),
            inserted = result.inserted.len(),
            failed = result.failures.len(),
            "Bulk import finished"
        );

        Ok(result)
    }

    /// Persist candidates that are already unique within their batch.
    pub async fn reconcile(&self, unique: Vec<ImportCandidate>) -> StorageResult<BulkImportResult> {
        let mut result = BulkImportResult::default();
        if unique.is_empty() {
            return Ok(result);
        }

        if !self.repo.supports_bulk() {
            debug!("Store has no bulk operations, inserting one by one");
            self.insert_sequentially(&unique, &mut result).await;
            return Ok(result);
        }

        let keys: Vec<String> = unique.iter().map(|c| c.normalized_dni.clone()).collect();
        let existing: HashSet<String> = self
            .repo
            .find_existing(&keys)
            .await?
            .into_iter()
            .map(|m| m.dni)
            .collect();

        let (ready, taken): (Vec<_>, Vec<_>) = unique
            .into_iter()
            .partition(|c| !existing.contains(&c.normalized_dni));

        for candidate in &taken {
            result.failures.push(
                candidate.failure(FailureKind::DuplicateInStore, DisplayMessages::DUPLICATE_DNI),
            );
        }

        for (chunk_index, chunk) in ready.chunks(self.chunk_size).enumerate() {
            debug!(chunk = chunk_index, size = chunk.len(), "Inserting chunk");
            self.insert_chunk(chunk, &mut result).await;
        }

        Ok(result)
    }

    async fn insert_chunk(&self, chunk: &[ImportCandidate], result: &mut BulkImportResult) {
        let docs: Vec<NewMember> = chunk.iter().map(ImportCandidate::new_member).collect();

        match self.repo.insert_many(&docs).await {
            Ok(report) if !report.write_errors.is_empty() => {
                apply_write_errors(chunk, report, result);
            }
            Ok(report) if report.inserted_count == chunk.len() => {
                result.inserted.extend(chunk.iter().map(ImportCandidate::inserted));
            }
            Ok(report) => {
                warn!(
                    expected = chunk.len(),
                    reported = report.inserted_count,
                    "Bulk insert count mismatch, re-querying chunk"
                );
                self.reconcile_by_requery(chunk, result).await;
            }
            Err(e) => {
                warn!(error = %e, size = chunk.len(), "Bulk insert failed, re-querying chunk");
                self.reconcile_by_requery(chunk, result).await;
            }
        }
    }

    /// Decide an ambiguous chunk by looking at what the store now holds.
    ///
    /// Present rows count as inserted, absent rows as conflicts. If the
    /// lookup itself fails nothing can be confirmed and the whole chunk is
    /// reported with the store's message.
    async fn reconcile_by_requery(&self, chunk: &[ImportCandidate], result: &mut BulkImportResult) {
        let keys: Vec<String> = chunk.iter().map(|c| c.normalized_dni.clone()).collect();

        match self.repo.find_existing(&keys).await {
            Ok(found) => {
                let present: HashSet<String> = found.into_iter().map(|m| m.dni).collect();
                for candidate in chunk {
                    if present.contains(&candidate.normalized_dni) {
                        result.inserted.push(candidate.inserted());
                    } else {
                        result.failures.push(candidate.failure(
                            FailureKind::InsertConflict,
                            DisplayMessages::INSERT_CONFLICT,
                        ));
                    }
                }
            }
            Err(e) => {
                error!(error = %e, size = chunk.len(), "Re-query failed, chunk reported as failed");
                let message = e.to_string();
                result.failures.extend(
                    chunk
                        .iter()
                        .map(|c| c.failure(FailureKind::Store, message.clone())),
                );
            }
        }
    }

    async fn insert_sequentially(&self, unique: &[ImportCandidate], result: &mut BulkImportResult) {
        for candidate in unique {
            match self.repo.insert_one(&candidate.new_member()).await {
                Ok(InsertOutcome::Inserted(_)) => result.inserted.push(candidate.inserted()),
                Ok(InsertOutcome::DuplicateKey) => result.failures.push(
                    candidate.failure(FailureKind::DuplicateInStore, DisplayMessages::DUPLICATE_DNI),
                ),
                Err(e) => {
                    warn!(error = %e, row = candidate.row_number, "Single insert failed");
                    result.failures.push(candidate.failure(
                        FailureKind::Store,
                        DisplayMessages::insert_failed(&e.to_string()),
                    ));
                }
            }
        }
    }
}

/// Map reported write errors back to their rows; every other row was stored.
fn apply_write_errors(
    chunk: &[ImportCandidate],
    report: BulkInsertReport,
    result: &mut BulkImportResult,
) {
    let errors: HashMap<usize, WriteErrorKind> = report
        .write_errors
        .into_iter()
        .map(|e| (e.index, e.kind))
        .collect();

    for (index, candidate) in chunk.iter().enumerate() {
        match errors.get(&index) {
            None => result.inserted.push(candidate.inserted()),
            Some(WriteErrorKind::DuplicateKey) => result.failures.push(
                candidate.failure(FailureKind::DuplicateInStore, DisplayMessages::DUPLICATE_DNI),
            ),
            Some(WriteErrorKind::Other(message)) => result
                .failures
                .push(candidate.failure(FailureKind::Store, message.clone())),
        }
    }
}
