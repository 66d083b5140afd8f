use calibre_backup::commands::{self, Cli};
use calibre_backup::{BackupError, logging};
use clap::{CommandFactory, Parser};
use std::process;

/// Entry point for calibre-backup.
/// Parses command-line arguments, runs the backup and maps the outcome to an exit status.
fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match commands::run(&cli) {
        Ok(()) => {}
        Err(BackupError::Usage) => {
            let _ = Cli::command().print_help();
            process::exit(BackupError::Usage.exit_code());
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    }
}
