//! Migration framework
//!
//! Provides:
//! - Migration runner with stored checksums and tamper detection
//! - Idempotent application
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
