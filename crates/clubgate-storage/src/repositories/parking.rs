#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::ParkingState;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository trait for the singleton parking occupancy record
///
/// # Atomicity
///
/// `adjust` must check the bounds and write the new count as one indivisible
/// step. A read-then-write sequence would let two concurrent arrivals near
/// capacity both pass the check and overshoot `total`.
pub trait ParkingRepository: Send + Sync {
    /// Create the record with `occupied = 0` if it does not exist yet.
    ///
    /// An existing record is returned untouched.
    async fn initialize(&self, total: i64) -> StorageResult<ParkingState>;

    /// Read the current state
    async fn read(&self) -> StorageResult<ParkingState>;

    /// Add `delta` to `occupied` only if the result stays within `0..=total`.
    ///
    /// Returns the state after the call, unchanged when the bound was hit.
    async fn adjust(&self, delta: i64) -> StorageResult<ParkingState>;
}

/// SQLite implementation of ParkingRepository
pub struct SqliteParkingRepository {
    pool: SqlitePool,
}

impl SqliteParkingRepository {
    /// Create a new SQLite parking repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ParkingRepository for SqliteParkingRepository {
    async fn initialize(&self, total: i64) -> StorageResult<ParkingState> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO parking_state (id, total, occupied, updated_at)
            VALUES (1, ?, 0, ?)
            "#,
        )
        .bind(total)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.read().await
    }

    async fn read(&self) -> StorageResult<ParkingState> {
        let state = sqlx::query_as::<_, ParkingState>(
            "SELECT total, occupied FROM parking_state WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        state.ok_or_else(StorageError::parking_not_initialized)
    }

    async fn adjust(&self, delta: i64) -> StorageResult<ParkingState> {
        // Bounds are checked in the WHERE clause so the check and the write
        // happen in the same statement.
        let updated = sqlx::query_as::<_, ParkingState>(
            r#"
            UPDATE parking_state
            SET occupied = occupied + ?, updated_at = ?
            WHERE id = 1
              AND occupied + ? >= 0
              AND occupied + ? <= total
            RETURNING total, occupied
            "#,
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(delta)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(state) => Ok(state),
            None => self.read().await,
        }
    }
}
