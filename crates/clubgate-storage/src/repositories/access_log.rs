#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::AccessLogEntry;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository trait for AccessLogEntry operations
///
/// Access logs are append-only: there is no update or delete.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait AccessLogRepository: Send + Sync {
    /// Append an entry for `dni` stamped with `at`
    async fn append(&self, dni: &str, at: DateTime<Utc>) -> StorageResult<AccessLogEntry>;

    /// Most recent entry for `dni`, if any
    async fn most_recent(&self, dni: &str) -> StorageResult<Option<AccessLogEntry>>;

    /// Entries for `dni`, newest first
    async fn find_by_dni(&self, dni: &str, limit: i64) -> StorageResult<Vec<AccessLogEntry>>;
}

/// SQLite implementation of AccessLogRepository
pub struct SqliteAccessLogRepository {
    pool: SqlitePool,
}

impl SqliteAccessLogRepository {
    /// Create a new SQLite access log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AccessLogRepository for SqliteAccessLogRepository {
    async fn append(&self, dni: &str, at: DateTime<Utc>) -> StorageResult<AccessLogEntry> {
        let entry = sqlx::query_as::<_, AccessLogEntry>(
            r#"
            INSERT INTO access_logs (dni, created_at)
            VALUES (?, ?)
            RETURNING id, dni, created_at
            "#,
        )
        .bind(dni)
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn most_recent(&self, dni: &str) -> StorageResult<Option<AccessLogEntry>> {
        let entry = sqlx::query_as::<_, AccessLogEntry>(
            r#"
            SELECT id, dni, created_at
            FROM access_logs
            WHERE dni = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(dni)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn find_by_dni(&self, dni: &str, limit: i64) -> StorageResult<Vec<AccessLogEntry>> {
        let entries = sqlx::query_as::<_, AccessLogEntry>(
            r#"
            SELECT id, dni, created_at
            FROM access_logs
            WHERE dni = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(dni)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
