//! Command-line interface definition and the run it drives.
//!
//! A backup run is strictly sequential: locate `calibre-debug`, check the
//! library, prepare the backup folder, export, then write the manifest.
//! `--verify` skips all of that and checks an existing backup instead.

use crate::config::{RunConfig, Settings};
use crate::constants::{EXPORT_TOOL, MANIFEST_NAME};
use crate::countdown::Countdown;
use crate::error::{BackupError, Result};
use crate::locator::{FixedTool, SearchPath, ToolLocator};
use crate::path_util::expand_path;
use crate::{export, manifest, preflight};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Back up a calibre library with calibre-debug and write a SHA-1 manifest.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Clean (remove calibre files from the backup location)
    #[arg(short, long)]
    pub clean: bool,
    /// Full path to backup location
    #[arg(short, long, value_name = "PATH")]
    pub backup: Option<PathBuf>,
    /// Full path to library
    #[arg(short, long, value_name = "PATH")]
    pub library: Option<PathBuf>,
    /// Delay time in seconds before deleting or backing up [default: 5]
    #[arg(short, long, value_name = "SECONDS")]
    pub wait: Option<u64>,
    /// Check an existing backup against its manifest instead of backing up
    #[arg(long, conflicts_with_all = ["library", "clean"])]
    pub verify: bool,
    /// Read settings from this file instead of the default config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// True when a path the selected mode needs was not given.
    pub fn missing_required(&self) -> bool {
        self.backup.is_none() || (!self.verify && self.library.is_none())
    }
}

/// Runs whatever `cli` asks for.
pub fn run(cli: &Cli) -> Result<()> {
    if cli.missing_required() {
        return Err(BackupError::Usage);
    }
    let settings = Settings::load(cli.config.as_deref())?;
    debug!("settings: {settings:?}");

    if cli.verify {
        let backup = cli.backup.as_deref().ok_or(BackupError::Usage)?;
        return verify(expand_path(backup)?);
    }

    let (Some(library), Some(backup)) = (cli.library.as_deref(), cli.backup.as_deref()) else {
        return Err(BackupError::Usage);
    };
    let config = RunConfig::new(
        expand_path(library)?,
        expand_path(backup)?,
        cli.clean,
        cli.wait,
        &settings,
    );

    let locator = tool_locator(&settings)?;
    let tool = locator
        .locate(EXPORT_TOOL)
        .ok_or(BackupError::ToolNotFound)?;
    run_backup(&tool, &config)
}

fn tool_locator(settings: &Settings) -> Result<Box<dyn ToolLocator>> {
    match &settings.tool {
        Some(tool) => Ok(Box::new(FixedTool(expand_path(tool)?))),
        None => Ok(Box::new(SearchPath::from_env(&settings.search_paths))),
    }
}

/// The full backup: pre-flight checks, export, manifest.
pub fn run_backup(tool: &Path, config: &RunConfig) -> Result<()> {
    info!("using {}", tool.display());
    preflight::check_library(&config.library)?;

    let countdown = Countdown::install()?;
    preflight::prepare_backup_location(config, &countdown)?;
    export::run_export(tool, config, &countdown)?;
    let count = manifest::write_manifest(&config.backup, countdown.interrupt())?;

    println!(
        "Backed up {} to {} ({count} files listed in {MANIFEST_NAME})",
        config.library.display(),
        config.backup.display()
    );
    Ok(())
}

fn verify(backup: PathBuf) -> Result<()> {
    let countdown = Countdown::install()?;
    let report = manifest::verify_manifest(&backup, countdown.interrupt())?;
    for path in &report.mismatched {
        println!("CHANGED {path}");
    }
    for path in &report.missing {
        println!("MISSING {path}");
    }
    println!(
        "{} of {} files match {MANIFEST_NAME}",
        report.matched.len(),
        report.total()
    );
    if report.is_ok() {
        Ok(())
    } else {
        Err(BackupError::VerifyFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}
