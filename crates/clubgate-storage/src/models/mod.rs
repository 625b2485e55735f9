pub mod access_log;
pub mod member;
pub mod parking;

pub use access_log::AccessLogEntry;
pub use member::{Member, NewMember};
pub use parking::ParkingState;
