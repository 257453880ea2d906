//! Core types shared across SecondBrain crates
//!
//! - **Correlation types**: RunId for tying together the events of one invocation
//! - **Categories and statuses**: the fixed vocabulary of the brain database
//! - **Schema constants**: canonical field keys and event names

pub mod category;
pub mod correlation;
pub mod schema;

pub use category::{AdminStatus, Category, InboxStatus, ProjectStatus};
pub use correlation::RunId;
