use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Member of the club, identified by DNI
///
/// # Fields
///
/// * `id` - Auto-increment primary key, assigned by the store
/// * `full_name` - Full name, non-empty
/// * `dni` - Normalized national ID (separators stripped), globally unique
/// * `created_at` - Record creation timestamp
/// * `updated_at` - Record last modification timestamp
///
/// # Database Schema
///
/// Maps to the `members` table:
/// - `dni` carries a UNIQUE index; the store is the final authority on
///   uniqueness even when callers pre-check
/// - `full_name` must not be blank
///
/// # Examples
///
/// ```
/// use clubgate_storage::models::NewMember;
///
/// let member = NewMember::new("Ana Pérez", "30111222");
/// assert_eq!(member.dni, "30111222");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    /// Auto-increment primary key
    pub id: i64,

    /// Full name
    pub full_name: String,

    /// Normalized DNI (separators stripped)
    pub dni: String,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,

    /// Record last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Member document ready to be inserted
///
/// `dni` is expected to be normalized already; repositories store it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewMember {
    pub full_name: String,
    pub dni: String,
}

impl NewMember {
    pub fn new(full_name: impl Into<String>, dni: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            dni: dni.into(),
        }
    }
}

impl From<&Member> for NewMember {
    fn from(member: &Member) -> Self {
        Self::new(member.full_name.clone(), member.dni.clone())
    }
}
