use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identity errors
    #[error("Invalid DNI: {0}")]
    InvalidDni(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading [`crate::config::ClubConfig`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
