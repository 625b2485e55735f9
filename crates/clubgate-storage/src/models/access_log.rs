use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access log entry representing a granted access
///
/// The access gate appends one entry per granted attempt; denials are not
/// recorded, so the newest entry of a DNI is always its last granted access.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `dni` - DNI of the member (denormalized copy, not a foreign key)
/// * `created_at` - When the access was granted
///
/// # Database Schema
///
/// Maps to the `access_logs` table, indexed on `(dni, created_at DESC)` so
/// the most recent entry of a member is a single index seek.
///
/// Logs are append-only and never updated or deleted by this crate.
///
/// # Examples
///
/// ```
/// use clubgate_storage::models::AccessLogEntry;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let entry = AccessLogEntry {
///     id: 1,
///     dni: "30111222".to_string(),
///     created_at: now - Duration::minutes(10),
/// };
///
/// assert_eq!(entry.minutes_since(now), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLogEntry {
    /// Auto-increment primary key
    pub id: i64,

    /// DNI of the member who was granted access
    pub dni: String,

    /// Timestamp of the access
    pub created_at: DateTime<Utc>,
}

impl AccessLogEntry {
    /// Whole minutes elapsed between this entry and `now`
    pub fn minutes_since(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.created_at).num_minutes()
    }
}
