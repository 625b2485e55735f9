//! In-memory repository implementations for tests and dry runs.
//!
//! These fakes honour the same contracts as the SQLite repositories,
//! including DNI uniqueness and the bounded parking update, so services can
//! be exercised without a database. The member fake can also be scripted to
//! misbehave the way a real store does under concurrency or partial failure.

use crate::error::{StorageError, StorageResult};
use crate::models::{AccessLogEntry, Member, NewMember, ParkingState};
use crate::repositories::{
    AccessLogRepository, BulkInsertReport, InsertOutcome, MemberRepository, ParkingRepository,
    WriteError, WriteErrorKind,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Scripted misbehaviour for the next `insert_many` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkFault {
    /// Another writer stores this member right before the bulk insert runs.
    ///
    /// The conflicting document shows up as a duplicate-key write error.
    ConcurrentInsert(NewMember),

    /// Store the first `stored` documents, then fail without a report.
    Opaque { stored: usize, message: String },

    /// Store every document but report `inserted_count = 0` and no errors.
    ShortCount,

    /// Reject the document at `index` with a non-duplicate write error and
    /// store the rest.
    WriteError { index: usize, message: String },
}

#[derive(Debug, Default)]
struct MemberState {
    next_id: i64,
    members: Vec<Member>,
    bulk_faults: VecDeque<BulkFault>,
    single_faults: HashMap<String, String>,
    lookups_before_failure: Option<usize>,
}

impl MemberState {
    fn position_of(&self, dni: &str) -> Option<usize> {
        self.members.iter().position(|m| m.dni == dni)
    }

    fn store(&mut self, doc: &NewMember) -> Option<Member> {
        if self.position_of(&doc.dni).is_some() {
            return None;
        }

        self.next_id += 1;
        let now = Utc::now();
        let member = Member {
            id: self.next_id,
            full_name: doc.full_name.clone(),
            dni: doc.dni.clone(),
            created_at: now,
            updated_at: now,
        };
        self.members.push(member.clone());
        Some(member)
    }
}

/// In-memory member store
#[derive(Debug)]
pub struct InMemoryMemberRepository {
    state: Mutex<MemberState>,
    bulk: bool,
    bulk_calls: AtomicUsize,
    single_calls: AtomicUsize,
}

impl InMemoryMemberRepository {
    /// Create an empty store with bulk support
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemberState::default()),
            bulk: true,
            bulk_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
        }
    }

    /// Create an empty store that only offers single-document operations
    pub fn without_bulk() -> Self {
        Self {
            bulk: false,
            ..Self::new()
        }
    }

    /// Store a member directly, bypassing call counters.
    pub async fn seed(&self, member: NewMember) -> Option<Member> {
        self.state.lock().await.store(&member)
    }

    /// Queue a fault for the next `insert_many` call.
    pub async fn push_bulk_fault(&self, fault: BulkFault) {
        self.state.lock().await.bulk_faults.push_back(fault);
    }

    /// Make every `insert_one` call for `dni` fail with `message`.
    pub async fn fail_single_insert(&self, dni: impl Into<String>, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .single_faults
            .insert(dni.into(), message.into());
    }

    /// Let `successful` more `find_existing` calls through, then fail every one after.
    pub async fn fail_lookups_after(&self, successful: usize) {
        self.state.lock().await.lookups_before_failure = Some(successful);
    }

    /// Number of stored members
    pub async fn len(&self) -> usize {
        self.state.lock().await.members.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of `insert_many` calls received
    pub fn bulk_insert_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    /// Number of `insert_one` calls received
    pub fn single_insert_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    fn unsupported(operation: &str) -> StorageError {
        StorageError::Internal(format!("{operation} is not supported by this store"))
    }
}

impl Default for InMemoryMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberRepository for InMemoryMemberRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Member>> {
        let state = self.state.lock().await;
        Ok(state.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_dni(&self, dni: &str) -> StorageResult<Option<Member>> {
        let state = self.state.lock().await;
        Ok(state.members.iter().find(|m| m.dni == dni).cloned())
    }

    async fn find_all(&self) -> StorageResult<Vec<Member>> {
        let state = self.state.lock().await;
        let mut members = state.members.clone();
        members.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn find_existing(&self, dnis: &[String]) -> StorageResult<Vec<Member>> {
        if !self.bulk {
            return Err(Self::unsupported("find_existing"));
        }

        let mut state = self.state.lock().await;
        if let Some(remaining) = state.lookups_before_failure {
            if remaining == 0 {
                return Err(StorageError::Internal("connection reset".to_string()));
            }
            state.lookups_before_failure = Some(remaining - 1);
        }

        Ok(state
            .members
            .iter()
            .filter(|m| dnis.contains(&m.dni))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, member: &NewMember) -> StorageResult<InsertOutcome> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().await;
        if let Some(message) = state.single_faults.get(&member.dni) {
            return Err(StorageError::Internal(message.clone()));
        }

        Ok(match state.store(member) {
            Some(stored) => InsertOutcome::Inserted(stored),
            None => InsertOutcome::DuplicateKey,
        })
    }

    async fn insert_many(&self, members: &[NewMember]) -> StorageResult<BulkInsertReport> {
        if !self.bulk {
            return Err(Self::unsupported("insert_many"));
        }
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().await;
        let fault = state.bulk_faults.pop_front();
        let mut rejected = None;

        match fault {
            Some(BulkFault::ConcurrentInsert(doc)) => {
                state.store(&doc);
            }
            Some(BulkFault::Opaque { stored, message }) => {
                for doc in members.iter().take(stored) {
                    state.store(doc);
                }
                return Err(StorageError::Internal(message));
            }
            Some(BulkFault::ShortCount) => {
                for doc in members {
                    state.store(doc);
                }
                return Ok(BulkInsertReport::default());
            }
            Some(BulkFault::WriteError { index, message }) => rejected = Some((index, message)),
            None => {}
        }

        let mut report = BulkInsertReport::default();
        for (index, doc) in members.iter().enumerate() {
            if let Some((_, message)) = rejected.as_ref().filter(|(i, _)| *i == index) {
                report.write_errors.push(WriteError {
                    index,
                    kind: WriteErrorKind::Other(message.clone()),
                });
            } else if state.store(doc).is_some() {
                report.inserted_count += 1;
            } else {
                report.write_errors.push(WriteError {
                    index,
                    kind: WriteErrorKind::DuplicateKey,
                });
            }
        }

        Ok(report)
    }

    async fn update(&self, member: &Member) -> StorageResult<Member> {
        let mut state = self.state.lock().await;

        if let Some(other) = state.position_of(&member.dni)
            && state.members[other].id != member.id
        {
            return Err(StorageError::duplicate_dni(&member.dni));
        }

        let existing = state
            .members
            .iter_mut()
            .find(|m| m.id == member.id)
            .ok_or_else(|| StorageError::member_not_found("id", member.id))?;

        existing.full_name = member.full_name.clone();
        existing.dni = member.dni.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let mut state = self.state.lock().await;
        let before = state.members.len();
        state.members.retain(|m| m.id != id);

        if state.members.len() == before {
            return Err(StorageError::member_not_found("id", id));
        }
        Ok(())
    }

    fn supports_bulk(&self) -> bool {
        self.bulk
    }
}

/// In-memory access log
#[derive(Debug, Default)]
pub struct InMemoryAccessLogRepository {
    entries: Mutex<Vec<AccessLogEntry>>,
    appends: AtomicUsize,
}

impl InMemoryAccessLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a past access without counting it as an append.
    pub async fn seed(&self, dni: &str, at: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        let id = entries.len() as i64 + 1;
        entries.push(AccessLogEntry {
            id,
            dni: dni.to_string(),
            created_at: at,
        });
    }

    /// Number of `append` calls received
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

impl AccessLogRepository for InMemoryAccessLogRepository {
    async fn append(&self, dni: &str, at: DateTime<Utc>) -> StorageResult<AccessLogEntry> {
        self.appends.fetch_add(1, Ordering::SeqCst);

        let mut entries = self.entries.lock().await;
        let entry = AccessLogEntry {
            id: entries.len() as i64 + 1,
            dni: dni.to_string(),
            created_at: at,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn most_recent(&self, dni: &str) -> StorageResult<Option<AccessLogEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.dni == dni)
            .max_by_key(|e| (e.created_at, e.id))
            .cloned())
    }

    async fn find_by_dni(&self, dni: &str, limit: i64) -> StorageResult<Vec<AccessLogEntry>> {
        let entries = self.entries.lock().await;
        let mut matching: Vec<AccessLogEntry> =
            entries.iter().filter(|e| e.dni == dni).cloned().collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        matching.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(matching)
    }
}

/// In-memory parking record
#[derive(Debug, Default)]
pub struct InMemoryParkingRepository {
    state: Mutex<Option<ParkingState>>,
    writes: AtomicUsize,
}

impl InMemoryParkingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state, as if a previous run had left it.
    pub fn with_state(state: ParkingState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of state changes performed
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ParkingRepository for InMemoryParkingRepository {
    async fn initialize(&self, total: i64) -> StorageResult<ParkingState> {
        let mut state = self.state.lock().await;
        if let Some(existing) = *state {
            return Ok(existing);
        }

        let created = ParkingState::empty(total);
        *state = Some(created);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn read(&self) -> StorageResult<ParkingState> {
        let state = self.state.lock().await;
        state.ok_or_else(StorageError::parking_not_initialized)
    }

    async fn adjust(&self, delta: i64) -> StorageResult<ParkingState> {
        // Check and write under one lock acquisition.
        let mut guard = self.state.lock().await;
        let current = (*guard).ok_or_else(StorageError::parking_not_initialized)?;

        match current.adjusted(delta) {
            Some(next) => {
                *guard = Some(next);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(next)
            }
            None => Ok(current),
        }
    }
}
