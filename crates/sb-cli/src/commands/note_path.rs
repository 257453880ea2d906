//! Note path command
//!
//! Usage: sb note-path <TYPE> <ID>

use clap::Args;
use sb_core::{Settings, VaultLayout};

#[derive(Debug, Args)]
pub struct NotePathArgs {
    /// Entity type, e.g. `projects`
    pub entity_type: String,

    /// Entity id
    pub id: String,
}

pub fn execute(args: NotePathArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let path = VaultLayout::from_settings(&settings).note_path(&args.entity_type, &args.id)?;
    println!("{}", path);
    Ok(())
}
