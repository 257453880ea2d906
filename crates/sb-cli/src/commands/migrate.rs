//! Migrate command

use clap::Args;
use sb_core::Settings;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Database file (defaults to `SB_DB` or ~/.secondbrain/brain.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = match args.db {
        Some(path) => path,
        None => Settings::load()?.db_path,
    };

    let mut conn = sb_store::db::open(&db_path)?;
    sb_store::migrations::apply_migrations(&mut conn)?;

    let applied = sb_store::migrations::applied_migrations(&conn)?;
    println!("Schema up to date: {}", db_path.display());
    for id in applied {
        println!("  {}", id);
    }
    Ok(())
}
