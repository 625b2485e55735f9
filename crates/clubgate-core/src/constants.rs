//! Core constants for the Clubgate membership system.
//!
//! Centralizes the defaults and lookup tables shared by the storage layer,
//! the import pipeline and the command line front end.
//!
//! # Usage
//!
//! ```
//! use clubgate_core::constants::*;
//!
//! assert_eq!(DEFAULT_IMPORT_CHUNK_SIZE, 500);
//! assert!(DNI_SEPARATORS.contains(&'.'));
//! ```

// ============================================================================
// Identity Normalization
// ============================================================================

/// Characters stripped from a DNI before it is used as a key.
///
/// Spreadsheets and manual entry commonly format documents as
/// `12.345.678` or `12-345-678`; whitespace is stripped as well
/// (see [`crate::dni::normalize_str`]).
pub const DNI_SEPARATORS: [char; 2] = ['.', '-'];

// ============================================================================
// Bulk Import
// ============================================================================

/// Default number of rows written per bulk insert.
///
/// Large imports are split into chunks of this size so a single store
/// round-trip never carries an unbounded payload.
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 500;

/// Offset between a 0-based input index and the human-facing row number.
///
/// Row 1 of a spreadsheet is the header, so the first data row is row 2.
pub const HEADER_ROW_OFFSET: usize = 2;

/// Header names accepted for the member's full name column.
pub const NAME_HEADERS: [&str; 6] = [
    "nombre",
    "name",
    "fullname",
    "full_name",
    "nombre completo",
    "nombre_completo",
];

/// Header names accepted for the DNI column.
pub const DNI_HEADERS: [&str; 5] = ["dni", "documento", "document", "cedula", "rut"];

/// Keys that carry an explicit source row number on an input record.
pub const ROW_NUMBER_KEYS: [&str; 2] = ["rowNumber", "sourceRow"];

// ============================================================================
// Configuration Defaults
// ============================================================================

/// Default SQLite database path.
pub const DEFAULT_DATABASE_PATH: &str = "clubgate.db";

/// Default size of the SQLite connection pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Environment variable holding the database path.
pub const ENV_DATABASE_PATH: &str = "DATABASE_PATH";

/// Environment variable holding the connection pool size.
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

/// Environment variable holding the access cooldown in minutes.
pub const ENV_ACCESS_LOG_THRESHOLD: &str = "ACCESS_LOG_THRESHOLD";

/// Environment variable holding the parking lot capacity.
pub const ENV_PARKING_SPACES: &str = "PARKING_SPACES";

/// Environment variable holding the bulk import chunk size.
pub const ENV_IMPORT_BATCH_SIZE: &str = "IMPORT_BATCH_SIZE";
