//! Integration tests for the parking counter against SQLite
//!
//! Run with: cargo test --package clubgate-storage --test integration_parking

use clubgate_storage::connection::{Database, DatabaseConfig};
use clubgate_storage::parking::ParkingService;
use clubgate_storage::repositories::SqliteParkingRepository;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Barrier;

async fn updated_at(db: &Database) -> String {
    let row: (String,) = sqlx::query_as("SELECT updated_at FROM parking_state WHERE id = 1")
        .fetch_one(db.pool())
        .await
        .unwrap();
    row.0
}

#[tokio::test]
async fn test_enter_on_full_lot_writes_nothing() {
    let db = Database::in_memory().await.unwrap();
    let parking = ParkingService::new(SqliteParkingRepository::new(db.pool().clone()));
    parking.initialize(50).await.unwrap();

    for _ in 0..50 {
        parking.enter().await.unwrap();
    }
    let before = updated_at(&db).await;

    let state = parking.enter().await.unwrap();

    assert_eq!(state.occupied, 50);
    assert_eq!(state.total, 50);
    assert_eq!(updated_at(&db).await, before);

    db.close().await;
}

#[tokio::test]
async fn test_leave_on_empty_lot() {
    let db = Database::in_memory().await.unwrap();
    let parking = ParkingService::new(SqliteParkingRepository::new(db.pool().clone()));
    parking.initialize(5).await.unwrap();

    let state = parking.leave().await.unwrap();
    assert_eq!(state.occupied, 0);
    assert_eq!(state.available(), 5);

    db.close().await;
}

/// Several pooled connections race for the last spaces of a file database.
#[tokio::test]
async fn test_concurrent_entries_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parking.db").to_string_lossy().to_string();
    let db = Database::new(DatabaseConfig::new(&path).max_connections(4))
        .await
        .unwrap();

    let parking = Arc::new(ParkingService::new(SqliteParkingRepository::new(
        db.pool().clone(),
    )));
    parking.initialize(5).await.unwrap();

    const NUM_CARS: usize = 20;
    let barrier = Arc::new(Barrier::new(NUM_CARS));

    let mut handles = vec![];
    for _ in 0..NUM_CARS {
        let parking = parking.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            parking.enter().await.unwrap()
        }));
    }

    let states: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert!(states.iter().all(|s| s.occupied <= s.total));
    assert_eq!(parking.status().await.unwrap().occupied, 5);

    db.close().await;
}
