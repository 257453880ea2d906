//! SecondBrain Core - pure domain logic
//!
//! This crate provides everything that does not touch the database or spawn
//! processes:
//! - Structured error facility and domain error taxonomy
//! - Logging facility (profiles, boundary macros, test capture)
//! - Settings resolution (environment, `config.sh`, defaults)
//! - Vault note path formatting
//! - Summary model and fixed-width rendering
//! - Inbox routing: prefix router, alias resolution, classifier output handling

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod routing;
pub mod summary;
pub mod vault;

pub use sb_core_types::schema;

// Re-export commonly used types
pub use config::Settings;
pub use errors::{Result, SbError, SbErrorKind, SecondBrainError};
pub use summary::Summary;
pub use vault::{note_path, VaultLayout};
