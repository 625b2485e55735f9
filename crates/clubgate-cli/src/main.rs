//! Clubgate CLI - member roster, access gate and parking counter.
//!
//! Configuration comes from the environment (a `.env` file in the working
//! directory is loaded first):
//!
//! ```bash
//! export ACCESS_LOG_THRESHOLD=30
//! export PARKING_SPACES=50
//! clubgate import socios.json
//! clubgate access 30.111.222
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr and follow
//! `RUST_LOG` (default `info`).

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clubgate", version, about = "Club membership and access control")]
struct Cli {
    /// Override DATABASE_PATH
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import members from a JSON array of sheet rows
    Import {
        /// File holding the rows
        file: PathBuf,

        /// Override IMPORT_BATCH_SIZE
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Register an access attempt
    Access {
        dni: String,
    },

    /// Show the latest accesses of a member
    AccessHistory {
        dni: String,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Manage members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Parking occupancy
    #[command(subcommand)]
    Parking(ParkingCommand),

    /// Check that the database is reachable
    Health,
}

#[derive(Subcommand)]
enum MemberCommand {
    /// Register a member
    Add { full_name: String, dni: String },

    /// Look a member up by DNI
    Get { dni: String },

    /// List all members by name
    List,

    /// Replace name and DNI of a member
    Update {
        id: i64,
        full_name: String,
        dni: String,
    },

    /// Remove a member
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ParkingCommand {
    Status,
    Enter,
    Leave,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_add() {
        let cli = Cli::try_parse_from(["clubgate", "member", "add", "Ana Pérez", "30.111.222"])
            .unwrap();

        match cli.command {
            Commands::Member(MemberCommand::Add { full_name, dni }) => {
                assert_eq!(full_name, "Ana Pérez");
                assert_eq!(dni, "30.111.222");
            }
            _ => panic!("expected member add"),
        }
    }

    #[test]
    fn test_parse_global_database_flag() {
        let cli = Cli::try_parse_from(["clubgate", "parking", "status", "--database", "/tmp/x.db"])
            .unwrap();

        assert_eq!(cli.database.as_deref(), Some("/tmp/x.db"));
        assert!(matches!(cli.command, Commands::Parking(ParkingCommand::Status)));
    }

    #[test]
    fn test_parse_access_history_default_limit() {
        let cli = Cli::try_parse_from(["clubgate", "access-history", "30111222"]).unwrap();

        match cli.command {
            Commands::AccessHistory { dni, limit } => {
                assert_eq!(dni, "30111222");
                assert_eq!(limit, 20);
            }
            _ => panic!("expected access-history"),
        }
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["clubgate", "import"]).is_err());
    }
}
