use crate::error::StorageResult;
use crate::models::ParkingState;
use crate::repositories::ParkingRepository;
use tracing::{debug, info};

/// Parking lot occupancy counter
///
/// `enter` and `leave` never fail because the lot is full or empty: the
/// state is returned unchanged and the caller compares it. Bounds are
/// enforced by the repository in a single atomic step, so concurrent
/// arrivals cannot push `occupied` past `total`.
pub struct ParkingService<P> {
    repo: P,
}

impl<P: ParkingRepository> ParkingService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &P {
        &self.repo
    }

    /// Create the occupancy record on first start.
    ///
    /// A record left by a previous run keeps its capacity and count.
    pub async fn initialize(&self, total: u32) -> StorageResult<ParkingState> {
        let state = self.repo.initialize(i64::from(total)).await?;
        info!(
            total = state.total,
            occupied = state.occupied,
            "Parking initialized"
        );
        Ok(state)
    }

    /// Current occupancy
    pub async fn status(&self) -> StorageResult<ParkingState> {
        self.repo.read().await
    }

    /// A vehicle comes in. No-op when the lot is full.
    pub async fn enter(&self) -> StorageResult<ParkingState> {
        let state = self.repo.adjust(1).await?;
        debug!(
            occupied = state.occupied,
            total = state.total,
            "Parking entry"
        );
        Ok(state)
    }

    /// A vehicle leaves. No-op when the lot is empty.
    pub async fn leave(&self) -> StorageResult<ParkingState> {
        let state = self.repo.adjust(-1).await?;
        debug!(
            occupied = state.occupied,
            total = state.total,
            "Parking exit"
        );
        Ok(state)
    }
}
