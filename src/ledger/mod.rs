//! Change ledger
//!
//! Keeps the first address seen for every interface changed in this
//! session and appends each successful change to the ledger file.

pub mod record;
pub mod store;

pub use record::{ChangeAction, ChangeRecord};
pub use store::LedgerStore;

use log::debug;
use std::collections::HashMap;
use std::path::Path;

use crate::address::MacAddress;
use crate::error::Result;
use crate::platform::InterfaceName;

pub struct ChangeLedger {
    originals: HashMap<InterfaceName, MacAddress>,
    store: LedgerStore,
}

impl ChangeLedger {
    pub fn new(store: LedgerStore) -> Self {
        Self {
            originals: HashMap::new(),
            store,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(LedgerStore::new(path.as_ref()))
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Remembers `address` as the original of `interface` unless one is
    /// already known. Later calls never overwrite the first value.
    pub fn record_original_if_absent(&mut self, interface: &InterfaceName, address: MacAddress) {
        self.originals.entry(interface.clone()).or_insert_with(|| {
            debug!("Original address of {} is {}", interface, address);
            address
        });
    }

    pub fn lookup_original(&self, interface: &InterfaceName) -> Option<MacAddress> {
        self.originals.get(interface).copied()
    }

    pub fn is_changed(&self, interface: &InterfaceName) -> bool {
        self.originals.contains_key(interface)
    }

    pub fn append(&self, record: ChangeRecord) -> Result<()> {
        self.store.append(record)
    }

    /// Fails with `CorruptLedger` when the file exists but cannot be parsed.
    pub fn verify(&self) -> Result<()> {
        self.store.load().map(|_| ())
    }

    /// Reads the whole file once. The returned `History` does not see
    /// records appended after this call.
    pub fn all_records(&self) -> Result<History> {
        Ok(History {
            records: self.store.load()?,
        })
    }

    /// Earliest known original of `interface` across every past run.
    pub fn original_from_history(&self, interface: &InterfaceName) -> Result<Option<MacAddress>> {
        let history = self.all_records()?;
        let original = history
            .iter()
            .filter(|r| r.interface() == interface.as_str())
            .filter(|r| r.action() == ChangeAction::Spoof)
            .find_map(|r| r.original_mac());
        Ok(original)
    }
}

/// Eagerly loaded snapshot of the ledger in append order. Iterating it
/// does not consume it.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<ChangeRecord>,
}

impl History {
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for History {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
