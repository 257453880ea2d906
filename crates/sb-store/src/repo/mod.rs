//! Repository layer
//!
//! Row-level reads and writes used by inbox processing.

pub mod sqlite_repo;

pub use sqlite_repo::{InboxItem, SqliteRepo, MAX_EVENT_DETAILS};
