//! Process command
//!
//! Usage: sb process [LIMIT] [--db <PATH>] [--model <NAME>]

use clap::Args;
use sb_core::routing::Aliases;
use sb_core::Settings;
use sb_engine::commands::process::{process_inbox, ProcessOptions, DEFAULT_LIMIT};
use sb_engine::OllamaClassifier;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Most inbox rows to handle in this run
    #[arg(default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,

    /// Database file (defaults to `SB_DB` or ~/.secondbrain/brain.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Ollama model (defaults to `SB_MODEL` or phi4-mini:latest)
    #[arg(long)]
    pub model: Option<String>,
}

pub fn execute(args: ProcessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let db_path = args.db.unwrap_or_else(|| settings.db_path.clone());
    let model = args.model.unwrap_or_else(|| settings.model.clone());

    let mut conn = sb_store::db::open(&db_path)?;
    sb_store::migrations::apply_migrations(&mut conn)?;

    let aliases = Aliases::load(&settings.aliases_path);
    tracing::debug!(db = %db_path.display(), aliases = aliases.len(), "process settings");
    let classifier = OllamaClassifier::new(model);
    let options = ProcessOptions::from_settings(&settings, args.limit);

    let report = process_inbox(&mut conn, &classifier, &aliases, &options)?;

    println!("Processed:    {}", report.processed);
    println!("Needs review: {}", report.needs_review);
    Ok(())
}
