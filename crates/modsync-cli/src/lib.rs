//! modsync - keep a mods folder current
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Hashes every `.jar` in a Minecraft mods folder, asks Modrinth which
//! version each one is, and replaces it with the newest build for the
//! requested game version.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.modsync/
//! └── logs/       # Daily rolling modsync.log.<date>
//! ```

pub mod logging;
pub mod ui;

pub use modsync_core::USER_AGENT;

use clap::Parser;
use logging::LogLevel;
use modsync_core::RunConfig;
use modsync_core::registry::modrinth::DEFAULT_BASE_URL;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Could not determine the default game directory; pass it as PATH or use --mods-dir")]
    NoGameDir,
}

#[derive(Debug, Parser)]
#[command(name = "modsync")]
#[command(author, version, about = "modsync - update Minecraft mods to a game version")]
pub struct Cli {
    /// Game version to update to (e.g. 1.20.1)
    pub game_version: String,

    /// Game directory; packages are read from its `mods` folder
    pub path: Option<PathBuf>,

    /// Use this package directory directly instead of `<PATH>/mods`
    #[arg(long, value_name = "DIR")]
    pub mods_dir: Option<PathBuf>,

    /// Keep superseded files instead of deleting them
    #[arg(short, long)]
    pub keep: bool,

    /// Show what would be updated without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum concurrent hashing and download tasks [default: CPU count]
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Registry API root
    #[arg(long, env = "MODSYNC_REGISTRY_URL", default_value = DEFAULT_BASE_URL)]
    pub registry_url: String,

    /// Directory for log files [default: ~/.modsync/logs]
    #[arg(long, env = "MODSYNC_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace, debug, info, warn(ing), error or critical
    #[arg(long, env = "MODSYNC_LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl Cli {
    /// The directory whose packages are reconciled.
    pub fn package_dir(&self) -> Result<PathBuf, CliError> {
        if let Some(dir) = &self.mods_dir {
            return Ok(dir.clone());
        }
        let game_dir = match &self.path {
            Some(path) => path.clone(),
            None => modsync_core::default_game_dir().ok_or(CliError::NoGameDir)?,
        };
        Ok(modsync_core::mods_dir(&game_dir))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(modsync_core::log_dir)
    }

    pub fn run_config(&self) -> Result<RunConfig, CliError> {
        let mut config = RunConfig::new(self.game_version.clone(), self.package_dir()?)
            .keep_old(self.keep)
            .dry_run(self.dry_run);
        if let Some(jobs) = self.jobs {
            config = config.concurrency(jobs);
        }
        Ok(config)
    }
}
