use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::platform::{Elevation, PlatformSetting};

/// Change the hardware (MAC) address of a network interface.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Network interface to spoof
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Specific MAC address to use (AA:BB:CC:DD:EE:FF or AA-BB-CC-DD-EE-FF)
    #[arg(short, long, conflicts_with = "random")]
    pub mac: Option<String>,

    /// Use a random locally administered address
    #[arg(short, long)]
    pub random: bool,

    /// Show interface status
    #[arg(short, long)]
    pub status: bool,

    /// Restore the original MAC address of an interface
    #[arg(short = 'R', long, value_name = "INTERFACE")]
    pub restore: Option<String>,

    /// List available interfaces
    #[arg(short, long)]
    pub list: bool,

    /// Print every change recorded in the ledger
    #[arg(long)]
    pub history: bool,

    /// Do not prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ledger file path, overrides the configuration file
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Log level
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformSetting,

    #[serde(default)]
    pub elevation: Elevation,

    /// Allow restore to use originals recorded by earlier runs.
    #[serde(default = "default_restore_from_history")]
    pub restore_from_history: bool,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
}

fn default_restore_from_history() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("mac_spoof_log.json")
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformSetting::default(),
            elevation: Elevation::default(),
            restore_from_history: default_restore_from_history(),
            ledger: LedgerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// File settings with command line overrides applied.
    pub fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(path) = &args.ledger {
            config.ledger.path = path.clone();
        }
        if let Some(level) = &args.log_level {
            config.log_level = level.clone();
        }
        Ok(config)
    }
}
