//! Error handling for sb-store
//!
//! Wraps sb-core SbError with store-specific helpers

use sb_core::errors::{SbError, SbErrorKind};

/// Result type alias using SbError
pub type Result<T> = std::result::Result<T, SbError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> SbError {
    SbError::new(SbErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> SbError {
    SbError::new(SbErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a missing inbox row error
pub fn inbox_not_found(inbox_id: i64) -> SbError {
    SbError::new(SbErrorKind::NotFound)
        .with_op("inbox_update")
        .with_inbox_id(inbox_id)
        .with_message("Inbox item not found")
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> SbError {
    SbError::new(SbErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> SbError {
    SbError::new(SbErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
