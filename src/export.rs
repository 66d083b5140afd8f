use crate::config::RunConfig;
use crate::constants::EXPORT_FLAG;
use crate::countdown::Countdown;
use crate::error::{BackupError, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Builds `<tool> --export-all-calibre-data <backup> <library>`.
pub fn export_command(tool: &Path, config: &RunConfig) -> Command {
    let mut cmd = Command::new(tool);
    cmd.arg(EXPORT_FLAG).arg(&config.backup).arg(&config.library);
    cmd
}

/// Counts down, then runs the export tool and waits for it to exit.
///
/// A non-zero exit aborts the run so no manifest is written over a partial
/// export.
pub fn run_export(tool: &Path, config: &RunConfig, countdown: &Countdown) -> Result<()> {
    countdown.run(
        &format!(
            "Backing up {} to {}",
            config.library.display(),
            config.backup.display()
        ),
        config.wait,
    )?;

    info!("running {}", tool.display());
    let status = export_command(tool, config)
        .status()
        .map_err(|e| BackupError::io(tool, e))?;
    // The tool shares our terminal, so Ctrl-C reaches it too.
    countdown.interrupt().check()?;
    if !status.success() {
        return Err(BackupError::ExportFailed { status });
    }
    info!("export finished");
    Ok(())
}
