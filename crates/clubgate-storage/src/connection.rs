//! SQLite pool setup for the club database.
//!
//! A file database runs in WAL mode so the CLI and concurrent tasks can read
//! while an import or a parking update holds the write lock. Writers that
//! find the lock taken wait up to [`BUSY_TIMEOUT`] instead of failing.

use crate::error::{StorageError, StorageResult};
use clubgate_core::ClubConfig;
use clubgate_core::constants::DEFAULT_DATABASE_MAX_CONNECTIONS;
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a caller waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the club database lives and how many connections may use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite file; missing parent directories are created
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Apply pending migrations when opening
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }

    /// Set the pool size (at least one connection is always kept)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Set whether opening the database applies migrations
    pub fn auto_migrate(mut self, migrate: bool) -> Self {
        self.auto_migrate = migrate;
        self
    }
}

impl From<&ClubConfig> for DatabaseConfig {
    fn from(config: &ClubConfig) -> Self {
        Self::new(config.database_path.clone()).max_connections(config.database_max_connections)
    }
}

/// Connection pool over the club database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file described by `config`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use clubgate_core::ClubConfig;
    /// use clubgate_storage::connection::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let club = ClubConfig::from_env()?;
    /// let db = Database::new(DatabaseConfig::from(&club)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(config: DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.database_path))
            .map_err(|e| {
                StorageError::Configuration(format!(
                    "invalid database path {}: {e}",
                    config.database_path
                ))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        tracing::info!(
            path = %config.database_path,
            connections = config.max_connections,
            "Opened club database"
        );

        if config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Migrated private database held by a single connection, for tests.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // every extra connection would see its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded `migrations/` scripts that have not run yet.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::debug!("Club schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn club_tables(db: &Database) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name IN ('members', 'access_logs', 'parking_state')
             ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    #[test]
    fn test_config_follows_club_config() {
        let club = ClubConfig::new(30, 50)
            .database_path("data/club.db")
            .database_max_connections(3);

        assert_eq!(
            DatabaseConfig::from(&club),
            DatabaseConfig {
                database_path: "data/club.db".to_string(),
                max_connections: 3,
                auto_migrate: true,
            }
        );
    }

    #[test]
    fn test_pool_size_never_zero() {
        assert_eq!(DatabaseConfig::new("x.db").max_connections(0).max_connections, 1);
    }

    #[tokio::test]
    async fn test_in_memory_has_club_schema() {
        let db = Database::in_memory().await.unwrap();

        assert_eq!(club_tables(&db).await, vec!["access_logs", "members", "parking_state"]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_new_creates_nested_directory_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("club").join("data").join("club.db");

        let db = Database::new(DatabaseConfig::new(path.to_string_lossy()))
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(club_tables(&db).await.len(), 3);
        db.health_check().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_auto_migrate_disabled_leaves_file_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.db");

        let db = Database::new(DatabaseConfig::new(path.to_string_lossy()).auto_migrate(false))
            .await
            .unwrap();
        assert!(club_tables(&db).await.is_empty());

        db.migrate().await.unwrap();
        assert_eq!(club_tables(&db).await.len(), 3);
        db.close().await;
    }
}
