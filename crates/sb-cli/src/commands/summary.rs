//! Summary command
//!
//! Usage: sb summary [DB]

use clap::Args;
use sb_core::Settings;
use sb_engine::commands::summary::print_summary;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Database file (defaults to `SB_DB` or ~/.secondbrain/brain.db)
    pub db: Option<PathBuf>,
}

pub fn execute(args: SummaryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = match args.db {
        Some(path) => path,
        None => Settings::load()?.db_path,
    };

    let conn = sb_store::db::open_read_only(&db_path)?;
    print_summary(&conn, &mut std::io::stdout().lock())?;
    Ok(())
}
