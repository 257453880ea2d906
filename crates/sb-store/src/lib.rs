//! SecondBrain Store - SQLite persistence
//!
//! Provides:
//! - Connection helpers (read-write and read-only)
//! - Embedded schema migrations with checksums
//! - Repository for inbox processing writes and the event log
//! - The single-query summary

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod summary;

// Re-export key types
pub use errors::Result;
pub use repo::{InboxItem, SqliteRepo, MAX_EVENT_DETAILS};
pub use summary::load_summary;
