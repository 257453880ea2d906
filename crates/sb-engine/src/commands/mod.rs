//! Command orchestration layer.
//!
//! ## Logging Ownership
//!
//! Commands here emit `log_op_start!` / `log_op_end!` / `log_op_error!`.
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

pub mod install;
pub mod process;
pub mod summary;
