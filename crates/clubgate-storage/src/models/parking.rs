use serde::{Deserialize, Serialize};

/// Occupancy of the parking lot
///
/// A singleton record: `0 <= occupied <= total` holds at all times and is
/// enforced by a CHECK constraint on the `parking_state` table.
///
/// # Examples
///
/// ```
/// use clubgate_storage::models::ParkingState;
///
/// let state = ParkingState { total: 50, occupied: 10 };
/// assert_eq!(state.available(), 40);
/// assert!(!state.is_full());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParkingState {
    /// Configured capacity
    pub total: i64,

    /// Spaces currently in use
    pub occupied: i64,
}

impl ParkingState {
    /// Empty lot with the given capacity
    pub fn empty(total: i64) -> Self {
        Self { total, occupied: 0 }
    }

    /// Free spaces
    pub fn available(&self) -> i64 {
        self.total - self.occupied
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.total
    }

    pub fn is_empty(&self) -> bool {
        self.occupied <= 0
    }

    /// State after applying `delta`, or `None` if it would leave `0..=total`.
    pub fn adjusted(&self, delta: i64) -> Option<Self> {
        let occupied = self.occupied.checked_add(delta)?;
        (0..=self.total).contains(&occupied).then_some(Self {
            total: self.total,
            occupied,
        })
    }
}
