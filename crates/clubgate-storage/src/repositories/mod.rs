pub mod access_log;
pub mod member;
pub mod memory;
pub mod parking;

pub use access_log::{AccessLogRepository, SqliteAccessLogRepository};
pub use member::{
    BulkInsertReport, InsertOutcome, MemberRepository, SqliteMemberRepository, WriteError,
    WriteErrorKind,
};
pub use memory::{
    BulkFault, InMemoryAccessLogRepository, InMemoryMemberRepository, InMemoryParkingRepository,
};
pub use parking::{ParkingRepository, SqliteParkingRepository};
