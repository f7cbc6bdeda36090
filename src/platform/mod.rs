pub mod command;
pub mod interface;
pub mod linux;
pub mod macos;
pub mod windows;

pub use command::{CommandLine, CommandOutput, CommandRunner, SystemCommandRunner};
pub use interface::{create_adapter, InterfaceName, PlatformAdapter};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SpoofError};

/// Operating system family, written into the `system` field of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Darwin,
    Linux,
    Windows,
}

impl PlatformKind {
    pub fn detect() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Result<Self> {
        match os {
            "macos" => Ok(PlatformKind::Darwin),
            "linux" => Ok(PlatformKind::Linux),
            "windows" => Ok(PlatformKind::Windows),
            other => Err(SpoofError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Darwin => "darwin",
            PlatformKind::Linux => "linux",
            PlatformKind::Windows => "windows",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which adapter variant to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSetting {
    #[default]
    Auto,
    #[serde(alias = "macos")]
    Darwin,
    Linux,
    Windows,
}

impl PlatformSetting {
    pub fn resolve(self) -> Result<PlatformKind> {
        match self {
            PlatformSetting::Auto => PlatformKind::detect(),
            PlatformSetting::Darwin => Ok(PlatformKind::Darwin),
            PlatformSetting::Linux => Ok(PlatformKind::Linux),
            PlatformSetting::Windows => Ok(PlatformKind::Windows),
        }
    }
}

/// When privileged commands get a `sudo` prefix on macOS and Linux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
    #[default]
    Auto,
    Always,
    Never,
}

impl Elevation {
    pub fn use_sudo(self) -> bool {
        match self {
            Elevation::Auto => !is_elevated(),
            Elevation::Always => true,
            Elevation::Never => false,
        }
    }
}

#[cfg(unix)]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_elevated() -> bool {
    false
}
