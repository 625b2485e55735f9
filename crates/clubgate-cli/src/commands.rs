use crate::{Cli, Commands, MemberCommand, ParkingCommand};
use anyhow::{Context, Result, bail};
use clubgate_core::dni::normalize_str;
use clubgate_core::{ClubConfig, RowRecord};
use clubgate_storage::repositories::{
    AccessLogRepository, SqliteAccessLogRepository, SqliteMemberRepository,
    SqliteParkingRepository,
};
use clubgate_storage::{
    AccessGate, BulkImporter, Database, DatabaseConfig, MemberService, ParkingService,
    ParkingState,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Parking state as shown to operators
#[derive(Debug, Serialize, PartialEq, Eq)]
struct ParkingStatus {
    total: i64,
    occupied: i64,
    available: i64,
}

impl From<ParkingState> for ParkingStatus {
    fn from(state: ParkingState) -> Self {
        Self {
            total: state.total,
            occupied: state.occupied,
            available: state.available(),
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = ClubConfig::from_env().context("invalid configuration")?;
    if let Some(path) = cli.database {
        config = config.database_path(path);
    }

    let db = Database::new(DatabaseConfig::from(&config))
        .await
        .with_context(|| format!("failed to open database at {}", config.database_path))?;

    let result = dispatch(cli.command, &config, &db).await;
    db.close().await;
    result
}

async fn dispatch(command: Commands, config: &ClubConfig, db: &Database) -> Result<()> {
    let pool = db.pool().clone();

    match command {
        Commands::Import { file, chunk_size } => {
            let records = read_records(&file)?;
            info!(rows = records.len(), file = %file.display(), "Importing members");

            let importer = BulkImporter::new(SqliteMemberRepository::new(pool))
                .with_chunk_size(chunk_size.unwrap_or(config.import_chunk_size));
            print_json(&importer.import_records(&records).await?)
        }
        Commands::Access { dni } => {
            let gate = AccessGate::new(
                SqliteMemberRepository::new(pool.clone()),
                SqliteAccessLogRepository::new(pool),
                config.access_cooldown_minutes()?,
            );
            print_json(&gate.evaluate(&dni).await?)
        }
        Commands::AccessHistory { dni, limit } => {
            let logs = SqliteAccessLogRepository::new(pool);
            print_json(&logs.find_by_dni(&normalize_str(&dni), limit).await?)
        }
        Commands::Member(command) => {
            run_member(command, MemberService::new(SqliteMemberRepository::new(pool))).await
        }
        Commands::Parking(command) => {
            let parking = ParkingService::new(SqliteParkingRepository::new(pool));
            parking.initialize(config.parking_capacity()?).await?;

            let state = match command {
                ParkingCommand::Status => parking.status().await?,
                ParkingCommand::Enter => parking.enter().await?,
                ParkingCommand::Leave => parking.leave().await?,
            };
            print_json(&ParkingStatus::from(state))
        }
        Commands::Health => {
            db.health_check().await?;
            println!("ok");
            Ok(())
        }
    }
}

async fn run_member(
    command: MemberCommand,
    members: MemberService<SqliteMemberRepository>,
) -> Result<()> {
    match command {
        MemberCommand::Add { full_name, dni } => {
            print_json(&members.create(&full_name, &dni).await?)
        }
        MemberCommand::Get { dni } => match members.find_by_dni(&dni).await? {
            Some(member) => print_json(&member),
            None => bail!("no member with DNI {dni}"),
        },
        MemberCommand::List => print_json(&members.list().await?),
        MemberCommand::Update { id, full_name, dni } => {
            print_json(&members.update(id, &full_name, &dni).await?)
        }
        MemberCommand::Delete { id } => {
            members.delete(id).await?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<RowRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(records_from_value(value))
}

/// Rows of an import payload.
///
/// Anything but an array is an empty import. Non-object elements stay in
/// place as empty records so row numbers keep matching the sheet.
fn records_from_value(value: Value) -> Vec<RowRecord> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => record,
                _ => RowRecord::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
