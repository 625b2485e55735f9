//! Runtime configuration.
//!
//! All tunables are injected at construction time; nothing in the storage
//! layer reads the environment on its own.
//!
//! The access cooldown and the parking capacity have no sensible default,
//! but only the gate and the parking counter need them. They are parsed
//! eagerly and required lazily through [`ClubConfig::access_cooldown_minutes`]
//! and [`ClubConfig::parking_capacity`].

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_DATABASE_PATH, DEFAULT_IMPORT_CHUNK_SIZE,
    ENV_ACCESS_LOG_THRESHOLD, ENV_DATABASE_MAX_CONNECTIONS, ENV_DATABASE_PATH,
    ENV_IMPORT_BATCH_SIZE, ENV_PARKING_SPACES,
};
use crate::error::{ConfigError, Result};
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Size of the SQLite connection pool
    pub database_max_connections: u32,

    /// Rows per bulk insert during imports
    pub import_chunk_size: usize,

    access_cooldown_minutes: Option<u32>,
    parking_capacity: Option<u32>,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            import_chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
            access_cooldown_minutes: None,
            parking_capacity: None,
        }
    }
}

impl ClubConfig {
    /// Create a configuration with the required values and defaults for the rest.
    pub fn new(access_cooldown_minutes: u32, parking_capacity: u32) -> Self {
        Self {
            access_cooldown_minutes: Some(access_cooldown_minutes),
            parking_capacity: Some(parking_capacity),
            ..Self::default()
        }
    }

    /// Set the database path
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Set the connection pool size
    pub fn database_max_connections(mut self, max: u32) -> Self {
        self.database_max_connections = max;
        self
    }

    /// Set the bulk import chunk size
    pub fn import_chunk_size(mut self, size: usize) -> Self {
        self.import_chunk_size = size;
        self
    }

    /// Minimum minutes between two granted accesses of the same member.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) when `ACCESS_LOG_THRESHOLD`
    /// was not set.
    pub fn access_cooldown_minutes(&self) -> Result<u32> {
        self.access_cooldown_minutes
            .ok_or_else(|| ConfigError::MissingEnvVar(ENV_ACCESS_LOG_THRESHOLD.to_string()).into())
    }

    /// Fixed capacity of the parking lot.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) when `PARKING_SPACES` was not set.
    pub fn parking_capacity(&self) -> Result<u32> {
        self.parking_capacity
            .ok_or_else(|| ConfigError::MissingEnvVar(ENV_PARKING_SPACES.to_string()).into())
    }

    /// Load configuration from process environment variables.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `DATABASE_PATH` | no | `clubgate.db` |
    /// | `DATABASE_MAX_CONNECTIONS` | no | `5` |
    /// | `ACCESS_LOG_THRESHOLD` | by `access` | |
    /// | `PARKING_SPACES` | by `parking` | |
    /// | `IMPORT_BATCH_SIZE` | no | `500` |
    ///
    /// Values that are present but unparsable are rejected here, whether or
    /// not the caller ends up needing them.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path =
            lookup(ENV_DATABASE_PATH).unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let database_max_connections = positive(
            &lookup,
            ENV_DATABASE_MAX_CONNECTIONS,
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;
        let import_chunk_size = positive(&lookup, ENV_IMPORT_BATCH_SIZE, DEFAULT_IMPORT_CHUNK_SIZE)?;

        Ok(Self {
            database_path,
            database_max_connections,
            import_chunk_size,
            access_cooldown_minutes: optional(&lookup, ENV_ACCESS_LOG_THRESHOLD)?,
            parking_capacity: optional(&lookup, ENV_PARKING_SPACES)?,
        })
    }
}

fn positive<F, T>(lookup: &F, var: &str, default: T) -> std::result::Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value = optional(lookup, var)?.unwrap_or(default);
    if value == T::default() {
        return Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn optional<F, T>(lookup: &F, var: &str) -> std::result::Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvValue {
                var: var.to_string(),
                reason: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_with_defaults() {
        let config = ClubConfig::from_lookup(lookup_from(&[
            ("ACCESS_LOG_THRESHOLD", "30"),
            ("PARKING_SPACES", "50"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "clubgate.db");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.access_cooldown_minutes().unwrap(), 30);
        assert_eq!(config.parking_capacity().unwrap(), 50);
        assert_eq!(config.import_chunk_size, 500);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClubConfig::from_lookup(lookup_from(&[
            ("DATABASE_PATH", "/var/lib/clubgate/data.db"),
            ("DATABASE_MAX_CONNECTIONS", "8"),
            ("ACCESS_LOG_THRESHOLD", " 15 "),
            ("PARKING_SPACES", "120"),
            ("IMPORT_BATCH_SIZE", "100"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, "/var/lib/clubgate/data.db");
        assert_eq!(config.database_max_connections, 8);
        assert_eq!(config.access_cooldown_minutes().unwrap(), 15);
        assert_eq!(config.parking_capacity().unwrap(), 120);
        assert_eq!(config.import_chunk_size, 100);
    }

    #[test]
    fn test_loads_without_gate_or_parking_settings() {
        let config = ClubConfig::from_lookup(lookup_from(&[("DATABASE_PATH", "club.db")])).unwrap();

        assert_eq!(config.database_path, "club.db");
        assert!(matches!(
            config.access_cooldown_minutes(),
            Err(Error::Config(ConfigError::MissingEnvVar(ref var))) if var == "ACCESS_LOG_THRESHOLD"
        ));
        assert!(matches!(
            config.parking_capacity(),
            Err(Error::Config(ConfigError::MissingEnvVar(ref var))) if var == "PARKING_SPACES"
        ));
    }

    #[test]
    fn test_invalid_capacity() {
        let err = ClubConfig::from_lookup(lookup_from(&[
            ("ACCESS_LOG_THRESHOLD", "30"),
            ("PARKING_SPACES", "fifty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { ref var, .. } if var == "PARKING_SPACES"));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = ClubConfig::from_lookup(lookup_from(&[("IMPORT_BATCH_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { ref var, .. } if var == "IMPORT_BATCH_SIZE"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let err =
            ClubConfig::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvValue { ref var, .. } if var == "DATABASE_MAX_CONNECTIONS")
        );
    }

    #[test]
    fn test_builder() {
        let config = ClubConfig::new(10, 20)
            .database_path("test.db")
            .database_max_connections(2)
            .import_chunk_size(25);

        assert_eq!(config.database_path, "test.db");
        assert_eq!(config.database_max_connections, 2);
        assert_eq!(config.access_cooldown_minutes().unwrap(), 10);
        assert_eq!(config.parking_capacity().unwrap(), 20);
        assert_eq!(config.import_chunk_size, 25);
    }
}
