//! SecondBrain CLI
//!
//! Command-line interface for the SecondBrain database and vault

use clap::{Parser, Subcommand, ValueEnum};
use sb_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sb")]
#[command(about = "SecondBrain - personal knowledge management", long_about = None)]
struct Cli {
    /// Format of the diagnostic log on stderr
    #[arg(long, value_enum, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Link the executables into ~/.secondbrain/bin and put it on PATH
    Install(commands::install::InstallArgs),
    /// Print the vault path of an entity's markdown note
    NotePath(commands::note_path::NotePathArgs),
    /// Print the headline counts of the brain database
    Summary(commands::summary::SummaryArgs),
    /// Route unprocessed inbox captures into the category tables
    Process(commands::process::ProcessArgs),
    /// Create or upgrade the database schema
    Migrate(commands::migrate::MigrateArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(match cli.log_format {
        LogFormat::Text => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Install(args) => commands::install::execute(args),
        Commands::NotePath(args) => commands::note_path::execute(args),
        Commands::Summary(args) => commands::summary::execute(args),
        Commands::Process(args) => commands::process::execute(args),
        Commands::Migrate(args) => commands::migrate::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
