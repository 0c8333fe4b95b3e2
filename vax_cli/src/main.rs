mod command;
mod shell;

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use vax_core::*;

#[derive(Parser)]
#[command(name = "vaxsched")]
#[command(about = "Vaccine appointment reservation scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive command shell (default)
    Shell,

    /// Export the appointment ledger
    Export {
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    vax_core::logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.data.db_path = db;
    }

    match cli.command {
        Some(Commands::Export { format, out }) => cmd_export(&config, format.into(), out),
        Some(Commands::Shell) | None => cmd_shell(&config),
    }
}

fn cmd_shell(config: &Config) -> Result<()> {
    let mut scheduler = Scheduler::open(config)?;
    tracing::info!(
        session = %scheduler.session_id(),
        "Shell started on {:?}",
        config.data.db_path
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    shell::run(&mut scheduler, stdin.lock(), &mut stdout)?;
    Ok(())
}

fn cmd_export(config: &Config, format: ExportFormat, out: Option<PathBuf>) -> Result<()> {
    let db = Database::open(&config.data.db_path, config.storage.busy_timeout())?;

    match out {
        Some(path) => {
            let count = export_appointments_to_path(db.connection(), format, &path)?;
            println!("✓ Exported {} appointments to {}", count, path.display());
        }
        None => {
            export_appointments(db.connection(), format, io::stdout().lock())?;
        }
    }

    Ok(())
}
