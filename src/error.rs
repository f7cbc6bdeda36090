use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpoofError {
    #[error("Invalid MAC address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid interface name: {0:?}")]
    InvalidInterface(String),

    #[error("Could not read current MAC address of {0}")]
    UnreadableAddress(String),

    #[error("Failed to apply MAC address on {interface}: {diagnostic}")]
    PlatformApplyFailed {
        interface: String,
        diagnostic: String,
    },

    #[error("Ledger {} is corrupt: {reason}", .path.display())]
    CorruptLedger {
        path: PathBuf,
        reason: String,
    },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("No original MAC address stored for {0}")]
    NoOriginal(String),

    #[error("Failed to run {program}: {reason}")]
    Command {
        program: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error {0}")]
    Io(io::ErrorKind),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpoofError {
    /// Process exit code reported by the command line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            SpoofError::Cancelled => 0,
            SpoofError::InvalidFormat(_)
            | SpoofError::InvalidInterface(_)
            | SpoofError::Config(_) => 2,
            SpoofError::UnsupportedPlatform(_) => 3,
            SpoofError::CorruptLedger { .. } | SpoofError::Io(_) => 4,
            _ => 1,
        }
    }
}

impl From<io::Error> for SpoofError {
    fn from(err: io::Error) -> Self {
        SpoofError::Io(err.kind())
    }
}

impl From<serde_yaml::Error> for SpoofError {
    fn from(err: serde_yaml::Error) -> Self {
        SpoofError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpoofError>;
