pub mod calendar;
pub mod clock;
pub mod ids;
pub mod model;
pub mod planner;
pub mod query;
pub mod storage;
pub mod store;
pub mod timefmt;
pub mod transfer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use planner::Planner;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{Store, StoreError};
