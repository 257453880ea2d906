//! Install command
//!
//! Usage: sb install [--from <DIR>] [--prefix <PREFIX>]

use clap::Args;
use sb_core::Settings;
use sb_engine::commands::install::{install, InstallPlan, DEFAULT_PREFIX};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Directory holding the executables (defaults to this binary's directory)
    #[arg(long)]
    pub from: Option<PathBuf>,

    /// Only link files whose name starts with this
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,
}

pub fn execute(args: InstallArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;

    let source_dir = match args.from {
        Some(dir) => dir,
        None => std::env::current_exe()?
            .parent()
            .ok_or("cannot locate the directory of the running executable")?
            .to_path_buf(),
    };

    let mut plan = InstallPlan::from_settings(&settings, source_dir);
    plan.prefix = args.prefix;

    let report = install(&plan)?;

    for link in &report.linked {
        println!("✓ Linked {}", link.display());
    }
    for link in &report.unchanged {
        println!("  Unchanged {}", link.display());
    }
    if report.rc_updated {
        println!("✓ Added {} to {}", plan.bin_dir.display(), plan.rc_file.display());
        println!("Open a new shell (or `source {}`) to use it.", plan.rc_file.display());
    } else {
        println!("  {} already on PATH in {}", plan.bin_dir.display(), plan.rc_file.display());
    }
    Ok(())
}
