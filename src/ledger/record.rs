use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::address::MacAddress;
use crate::platform::{InterfaceName, PlatformKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    #[default]
    Spoof,
    Restore,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ChangeAction::Spoof => "spoof",
            ChangeAction::Restore => "restore",
        })
    }
}

/// One successful address change, as stored in the ledger file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    timestamp: String,
    interface: String,
    #[serde(default, deserialize_with = "lenient_mac")]
    original_mac: Option<MacAddress>,
    new_mac: MacAddress,
    system: PlatformKind,
    #[serde(default)]
    action: ChangeAction,
}

impl ChangeRecord {
    pub fn new(
        interface: &InterfaceName,
        original_mac: Option<MacAddress>,
        new_mac: MacAddress,
        system: PlatformKind,
        action: ChangeAction,
    ) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            interface: interface.to_string(),
            original_mac,
            new_mac,
            system,
            action,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn original_mac(&self) -> Option<MacAddress> {
        self.original_mac
    }

    pub fn new_mac(&self) -> MacAddress {
        self.new_mac
    }

    pub fn system(&self) -> PlatformKind {
        self.system
    }

    pub fn action(&self) -> ChangeAction {
        self.action
    }
}

// Older logs store an empty string when the address could not be read.
fn lenient_mac<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MacAddress>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => text.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
