//! Storage layer for the Clubgate membership system.
//!
//! This crate provides SQLite-backed persistence for members, access logs and
//! parking occupancy, along with the services built on top of it: the bulk
//! member import, the cooldown-gated access check and the parking counter.
//!
//! # Architecture
//!
//! The storage layer uses a repository pattern with the following components:
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`MemberRepository`], [`AccessLogRepository`], [`ParkingRepository`] - Data access traits,
//!   each with a SQLite and an in-memory implementation
//! - [`BulkImporter`] - Batch import with per-row disposition
//! - [`AccessGate`] - Access decision with a per-member cooldown
//! - [`ParkingService`] - Bounded occupancy counter
//! - [`MemberService`] - Single-member management
//!
//! Services are generic over the repository traits and receive them at
//! construction, so tests swap in the in-memory fakes.
//!
//! # Consistency
//!
//! No in-process locks guard store state:
//!
//! - DNI uniqueness is the `UNIQUE` index on `members.dni`; the import
//!   pre-check only avoids pointless writes
//! - Parking bounds are checked inside the same `UPDATE` that changes the count
//!
//! # Examples
//!
//! ## Import and Access
//!
//! ```no_run
//! use clubgate_core::MemberRow;
//! use clubgate_storage::{AccessGate, BulkImporter, Database, DatabaseConfig};
//! use clubgate_storage::repositories::{SqliteAccessLogRepository, SqliteMemberRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::new("clubgate.db")
//!     .max_connections(10)
//!     .auto_migrate(true);
//! let db = Database::new(config).await?;
//!
//! let importer = BulkImporter::new(SqliteMemberRepository::new(db.pool().clone()));
//! let result = importer
//!     .import_rows(&[MemberRow::new("Ana Pérez", "30.111.222")])
//!     .await?;
//! println!("{} inserted, {} failed", result.inserted.len(), result.failures.len());
//!
//! let gate = AccessGate::new(
//!     SqliteMemberRepository::new(db.pool().clone()),
//!     SqliteAccessLogRepository::new(db.pool().clone()),
//!     30,
//! );
//! let decision = gate.evaluate("30111222").await?;
//! println!("{}: {}", decision.title, decision.subtitle);
//! # Ok(())
//! # }
//! ```
//!
//! ## Parking
//!
//! ```no_run
//! use clubgate_storage::{Database, ParkingService};
//! use clubgate_storage::repositories::SqliteParkingRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let parking = ParkingService::new(SqliteParkingRepository::new(db.pool().clone()));
//!
//! parking.initialize(50).await?;
//! let state = parking.enter().await?;
//! println!("{} of {} spaces free", state.available(), state.total);
//! # Ok(())
//! # }
//! ```
//!
//! # Performance
//!
//! - Connection pooling with configurable limits (default: 10 max, 2 min)
//! - WAL mode for better concurrent read/write performance
//! - Bulk existence lookups bind at most 500 keys per statement
//! - `access_logs` is indexed on `(dni, created_at)` for the most-recent lookup

pub mod connection;
pub mod error;
pub mod gate;
pub mod import;
pub mod members;
pub mod messages;
pub mod models;
pub mod parking;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use gate::{AccessDecision, AccessGate};
pub use import::{BulkImportResult, BulkImporter, FailureKind, ImportFailure, InsertedMember};
pub use members::MemberService;
pub use messages::DisplayMessages;
pub use models::{AccessLogEntry, Member, NewMember, ParkingState};
pub use parking::ParkingService;
pub use repositories::{
    AccessLogRepository, MemberRepository, ParkingRepository, SqliteAccessLogRepository,
    SqliteMemberRepository, SqliteParkingRepository,
};
