use std::fmt;

use super::linux::LinuxAdapter;
use super::macos::MacOsAdapter;
use super::windows::WindowsAdapter;
use super::{CommandRunner, PlatformKind};
use crate::address::MacAddress;
use crate::error::{Result, SpoofError};

const MAX_NAME_LEN: usize = 64;

/// Platform specific interface identifier (`en0`, `eth0`, `Wi-Fi`, `Ethernet 2`).
///
/// Names end up as command arguments and, on Windows, inside a quoted
/// PowerShell string, so only a conservative character set is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceName(String);

impl InterfaceName {
    pub fn new(name: &str) -> Result<Self> {
        let allowed = |c: char| c.is_ascii_alphanumeric() || " _.-#()".contains(c);
        if name.trim().is_empty()
            || name.len() > MAX_NAME_LEN
            || name.starts_with('-')
            || !name.chars().all(allowed)
        {
            return Err(SpoofError::InvalidInterface(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads and changes hardware addresses through the host's own tools.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformAdapter: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// Best effort; an empty list when detection fails.
    fn list_interfaces(&self) -> Vec<InterfaceName>;

    fn read_current_address(&self, name: &InterfaceName) -> Option<MacAddress>;

    /// Takes the interface down, sets the address and brings it back up.
    fn apply_address(&self, name: &InterfaceName, address: MacAddress) -> Result<()>;
}

pub fn create_adapter(
    kind: PlatformKind,
    runner: Box<dyn CommandRunner>,
    use_sudo: bool,
) -> Box<dyn PlatformAdapter> {
    match kind {
        PlatformKind::Linux => Box::new(LinuxAdapter::new(runner, use_sudo)),
        PlatformKind::Darwin => Box::new(MacOsAdapter::new(runner, use_sudo)),
        PlatformKind::Windows => Box::new(WindowsAdapter::new(runner)),
    }
}
