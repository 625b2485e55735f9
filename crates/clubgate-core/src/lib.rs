pub mod config;
pub mod constants;
pub mod dni;
pub mod error;
pub mod row;

pub use config::ClubConfig;
pub use dni::Dni;
pub use error::{ConfigError, Error, Result};
pub use row::{MemberRow, RowRecord};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
