use thiserror::Error;

/// Storage-specific error types for the Clubgate membership system.
///
/// These errors represent failures in database operations, validation
/// and uniqueness checks. Expected business outcomes (duplicate rows in an
/// import, a denied access) are not errors and never surface here.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Entity not found in database
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Unique key already taken
    #[error("Duplicate {entity_type}: {field}={value} already exists")]
    Duplicate {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Shorthand for a missing member lookup.
    pub(crate) fn member_not_found(field: &str, value: impl ToString) -> Self {
        Self::NotFound {
            entity_type: "Member".to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// The parking record has not been initialized yet.
    pub(crate) fn parking_not_initialized() -> Self {
        Self::NotFound {
            entity_type: "ParkingState".to_string(),
            field: "id".to_string(),
            value: "1".to_string(),
        }
    }

    /// Shorthand for a DNI uniqueness conflict.
    pub(crate) fn duplicate_dni(dni: &str) -> Self {
        Self::Duplicate {
            entity_type: "Member".to_string(),
            field: "dni".to_string(),
            value: dni.to_string(),
        }
    }
}

impl From<clubgate_core::Error> for StorageError {
    fn from(err: clubgate_core::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Whether a driver error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
