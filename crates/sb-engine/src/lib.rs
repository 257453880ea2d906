//! SecondBrain Engine - Orchestration layer
//!
//! Coordinates core domain logic, the store, the classifier process and the
//! filesystem. Owns lifecycle logging for every command.

pub mod classifier;
pub mod commands;

pub use classifier::{Classifier, OllamaClassifier};
