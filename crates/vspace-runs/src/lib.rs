//! Run records and the stores that persist them.

mod memory;
mod model;
pub mod schema;
mod sqlite;
mod store;

pub use memory::MemoryRunStore;
pub use model::{
    NewRun, Run, RunId, RunPage, RunQuery, RunSummary, RunType, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use sqlite::SqliteRunStore;
pub use store::RunStore;
