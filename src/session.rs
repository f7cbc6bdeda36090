//! Spoofing session
//!
//! Ties one platform adapter to one change ledger for the lifetime of a
//! run. All per-run state (the original address table) lives here.

use log::{info, warn};

use crate::address::{self, MacAddress};
use crate::error::{Result, SpoofError};
use crate::ledger::{ChangeAction, ChangeLedger, ChangeRecord, History};
use crate::platform::{InterfaceName, PlatformAdapter, PlatformKind};

/// Result of a successful change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoofOutcome {
    pub interface: InterfaceName,
    pub previous: Option<MacAddress>,
    pub applied: MacAddress,
    pub action: ChangeAction,
}

/// One row of the status view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStatus {
    pub interface: InterfaceName,
    pub current: Option<MacAddress>,
    pub original: Option<MacAddress>,
    pub spoofed: bool,
}

pub struct Spoofer {
    adapter: Box<dyn PlatformAdapter>,
    ledger: ChangeLedger,
    restore_from_history: bool,
}

impl Spoofer {
    pub fn new(adapter: Box<dyn PlatformAdapter>, ledger: ChangeLedger) -> Self {
        Self {
            adapter,
            ledger,
            restore_from_history: false,
        }
    }

    /// Let `restore` fall back to the ledger file when this run has not
    /// changed the interface yet.
    pub fn with_restore_from_history(mut self, enabled: bool) -> Self {
        self.restore_from_history = enabled;
        self
    }

    pub fn platform(&self) -> PlatformKind {
        self.adapter.kind()
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    /// Interfaces with their current addresses.
    pub fn interfaces(&self) -> Vec<(InterfaceName, Option<MacAddress>)> {
        self.adapter
            .list_interfaces()
            .into_iter()
            .map(|name| {
                let current = self.adapter.read_current_address(&name);
                (name, current)
            })
            .collect()
    }

    /// Changes `interface` to `requested`, or to a fresh random address.
    pub fn spoof(&mut self, interface: &str, requested: Option<&str>) -> Result<SpoofOutcome> {
        let interface = InterfaceName::new(interface)?;
        let address = match requested {
            Some(text) => address::normalize(text)?,
            None => address::generate(),
        };
        self.change(interface, address, ChangeAction::Spoof)
    }

    /// Puts back the first address seen for `interface`.
    pub fn restore(&mut self, interface: &str) -> Result<SpoofOutcome> {
        let interface = InterfaceName::new(interface)?;
        let original = match self.ledger.lookup_original(&interface) {
            Some(original) => original,
            None if self.restore_from_history => self
                .ledger
                .original_from_history(&interface)?
                .ok_or_else(|| SpoofError::NoOriginal(interface.to_string()))?,
            None => return Err(SpoofError::NoOriginal(interface.to_string())),
        };
        info!("Restoring {} to original MAC {}", interface, original);
        self.change(interface, original, ChangeAction::Restore)
    }

    pub fn status(&self) -> Result<Vec<InterfaceStatus>> {
        let mut rows = Vec::new();
        for (interface, current) in self.interfaces() {
            let spoofed = self.ledger.is_changed(&interface);
            let original = match self.ledger.lookup_original(&interface) {
                Some(original) => Some(original),
                None if self.restore_from_history => self.ledger.original_from_history(&interface)?,
                None => None,
            };
            rows.push(InterfaceStatus {
                interface,
                current,
                original,
                spoofed,
            });
        }
        Ok(rows)
    }

    pub fn history(&self) -> Result<History> {
        self.ledger.all_records()
    }

    fn change(
        &mut self,
        interface: InterfaceName,
        address: MacAddress,
        action: ChangeAction,
    ) -> Result<SpoofOutcome> {
        let previous = self.adapter.read_current_address(&interface);
        if previous.is_none() {
            warn!("{}", SpoofError::UnreadableAddress(interface.to_string()));
        }

        info!(
            "Changing {}: {} -> {}",
            interface,
            previous.map(|m| m.to_string()).unwrap_or_else(|| "unknown".into()),
            address
        );
        // Refuse to touch the hardware when the change could not be logged.
        self.ledger.verify()?;
        self.adapter.apply_address(&interface, address)?;

        // A restore target is the true original, even when it came from history
        // and the card currently carries a spoofed address.
        let original = match action {
            ChangeAction::Spoof => previous,
            ChangeAction::Restore => Some(address),
        };
        if let Some(original) = original {
            self.ledger.record_original_if_absent(&interface, original);
        }
        self.ledger.append(ChangeRecord::new(
            &interface,
            previous,
            address,
            self.adapter.kind(),
            action,
        ))?;
        info!("{} is now {}", interface, address);

        Ok(SpoofOutcome {
            interface,
            previous,
            applied: address,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::scratch_path;
    use crate::platform::interface::MockPlatformAdapter;
    use mockall::predicate::eq;
    use std::fs;
    use std::sync::{Arc, Mutex};

    const ORIGINAL: &str = "AA:BB:CC:DD:EE:FF";

    fn mac(text: &str) -> MacAddress {
        text.parse().unwrap()
    }

    fn eth0() -> InterfaceName {
        InterfaceName::new("eth0").unwrap()
    }

    /// Adapter double that reports whatever was last applied, starting at ORIGINAL.
    fn tracking_adapter(applied: Arc<Mutex<Vec<MacAddress>>>) -> MockPlatformAdapter {
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_kind().return_const(PlatformKind::Linux);

        let reads = applied.clone();
        adapter
            .expect_read_current_address()
            .with(eq(eth0()))
            .returning(move |_| Some(reads.lock().unwrap().last().copied().unwrap_or(mac(ORIGINAL))));
        adapter
            .expect_apply_address()
            .returning(move |_, address| {
                applied.lock().unwrap().push(address);
                Ok(())
            });
        adapter
    }

    #[test]
    fn test_spoof_with_generated_address() {
        let path = scratch_path("session-spoof");
        let applied = Arc::new(Mutex::new(Vec::new()));
        let mut spoofer = Spoofer::new(
            Box::new(tracking_adapter(applied.clone())),
            ChangeLedger::open(&path),
        );

        let outcome = spoofer.spoof("eth0", None).unwrap();
        assert!(address::validate(&outcome.applied.to_string()));
        assert!(outcome.applied.is_local() && outcome.applied.is_unicast());
        assert_eq!(outcome.previous, Some(mac(ORIGINAL)));

        let history = spoofer.history().unwrap();
        assert_eq!(history.len(), 1);
        let record = history.iter().next().unwrap();
        assert_eq!(record.original_mac(), Some(mac(ORIGINAL)));
        assert_eq!(record.new_mac(), outcome.applied);
        assert_eq!(record.interface(), "eth0");
        assert_eq!(record.system(), PlatformKind::Linux);

        assert_eq!(spoofer.ledger().lookup_original(&eth0()), Some(mac(ORIGINAL)));
        assert_eq!(*applied.lock().unwrap(), vec![outcome.applied]);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_restore_uses_first_original() {
        let path = scratch_path("session-restore");
        let applied = Arc::new(Mutex::new(Vec::new()));
        let mut spoofer = Spoofer::new(
            Box::new(tracking_adapter(applied.clone())),
            ChangeLedger::open(&path),
        );

        spoofer.spoof("eth0", None).unwrap();
        let second = spoofer.spoof("eth0", Some("06-00-00-00-00-02")).unwrap();
        assert_eq!(second.applied, mac("06:00:00:00:00:02"));

        let restored = spoofer.restore("eth0").unwrap();
        assert_eq!(restored.applied, mac(ORIGINAL));
        assert_eq!(restored.previous, Some(mac("06:00:00:00:00:02")));
        assert_eq!(applied.lock().unwrap().last(), Some(&mac(ORIGINAL)));

        let history: Vec<ChangeRecord> = spoofer.history().unwrap().into_iter().collect();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].new_mac(), mac(ORIGINAL));
        assert_eq!(history[2].original_mac(), Some(mac("06:00:00:00:00:02")));
        assert_eq!(history[2].action(), ChangeAction::Restore);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_failed_apply_changes_nothing() {
        let path = scratch_path("session-fail");
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_kind().return_const(PlatformKind::Darwin);
        adapter
            .expect_read_current_address()
            .returning(|_| Some(mac(ORIGINAL)));
        adapter.expect_apply_address().returning(|name, _| {
            Err(SpoofError::PlatformApplyFailed {
                interface: name.to_string(),
                diagnostic: "Operation not permitted".into(),
            })
        });
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(&path));

        let err = spoofer.spoof("en0", None).unwrap_err();
        assert!(matches!(err, SpoofError::PlatformApplyFailed { .. }));
        assert!(!path.exists());
        assert_eq!(
            spoofer.ledger().lookup_original(&InterfaceName::new("en0").unwrap()),
            None
        );
    }

    #[test]
    fn test_unreadable_original_is_recorded_as_null() {
        let path = scratch_path("session-unreadable");
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_kind().return_const(PlatformKind::Windows);
        adapter.expect_read_current_address().returning(|_| None);
        adapter.expect_apply_address().returning(|_, _| Ok(()));
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(&path));

        let outcome = spoofer.spoof("Wi-Fi", Some("02:00:00:00:00:09")).unwrap();
        assert_eq!(outcome.previous, None);

        let history = spoofer.history().unwrap();
        let record = history.iter().next().unwrap();
        assert_eq!(record.original_mac(), None);
        assert_eq!(spoofer.ledger().lookup_original(&outcome.interface), None);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_invalid_input_touches_nothing() {
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_read_current_address().never();
        adapter.expect_apply_address().never();
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(scratch_path("unused")));

        assert!(matches!(
            spoofer.spoof("eth0", Some("AA:BB-CC:DD:EE:FF")),
            Err(SpoofError::InvalidFormat(_))
        ));
        assert!(matches!(
            spoofer.spoof("eth0; rm -rf /", None),
            Err(SpoofError::InvalidInterface(_))
        ));
    }

    #[test]
    fn test_restore_without_original() {
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_apply_address().never();
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(scratch_path("unused")))
            .with_restore_from_history(true);

        assert!(matches!(spoofer.restore("eth0"), Err(SpoofError::NoOriginal(name)) if name == "eth0"));
    }

    #[test]
    fn test_restore_from_history_in_new_session() {
        let path = scratch_path("session-history");
        let applied = Arc::new(Mutex::new(Vec::new()));
        {
            let mut first_run = Spoofer::new(
                Box::new(tracking_adapter(applied.clone())),
                ChangeLedger::open(&path),
            );
            first_run.spoof("eth0", None).unwrap();
            first_run.spoof("eth0", None).unwrap();
        }

        let mut without_history = Spoofer::new(
            Box::new(tracking_adapter(applied.clone())),
            ChangeLedger::open(&path),
        );
        assert!(matches!(without_history.restore("eth0"), Err(SpoofError::NoOriginal(_))));

        let mut second_run = Spoofer::new(
            Box::new(tracking_adapter(applied.clone())),
            ChangeLedger::open(&path),
        )
        .with_restore_from_history(true);
        let restored = second_run.restore("eth0").unwrap();
        assert_eq!(restored.applied, mac(ORIGINAL));
        assert_eq!(second_run.history().unwrap().len(), 3);

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_repeated_history_restore_keeps_true_original() {
        let path = scratch_path("session-history-twice");
        let applied = Arc::new(Mutex::new(Vec::new()));
        {
            let mut first_run = Spoofer::new(
                Box::new(tracking_adapter(applied.clone())),
                ChangeLedger::open(&path),
            );
            first_run.spoof("eth0", Some("02:00:00:00:00:01")).unwrap();
        }

        let mut second_run = Spoofer::new(
            Box::new(tracking_adapter(applied.clone())),
            ChangeLedger::open(&path),
        )
        .with_restore_from_history(true);

        let first = second_run.restore("eth0").unwrap();
        assert_eq!(first.applied, mac(ORIGINAL));
        assert_eq!(first.previous, Some(mac("02:00:00:00:00:01")));
        assert_eq!(second_run.ledger().lookup_original(&eth0()), Some(mac(ORIGINAL)));

        second_run.spoof("eth0", Some("06:00:00:00:00:02")).unwrap();
        let second = second_run.restore("eth0").unwrap();
        assert_eq!(second.applied, mac(ORIGINAL));
        assert_eq!(applied.lock().unwrap().last(), Some(&mac(ORIGINAL)));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_corrupt_ledger_blocks_apply() {
        let path = scratch_path("session-corrupt");
        fs::write(&path, "garbage").unwrap();
        let mut adapter = MockPlatformAdapter::new();
        adapter.expect_kind().return_const(PlatformKind::Linux);
        adapter
            .expect_read_current_address()
            .returning(|_| Some(mac(ORIGINAL)));
        adapter.expect_apply_address().never();
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(&path));

        let err = spoofer.spoof("eth0", Some("02:00:00:00:00:01")).unwrap_err();
        assert!(matches!(err, SpoofError::CorruptLedger { .. }));
        assert_eq!(spoofer.ledger().lookup_original(&eth0()), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "garbage");

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_status_rows() {
        let path = scratch_path("session-status");
        let applied = Arc::new(Mutex::new(Vec::new()));
        let mut adapter = tracking_adapter(applied);
        adapter
            .expect_list_interfaces()
            .returning(|| vec![InterfaceName::new("eth0").unwrap(), InterfaceName::new("wlan0").unwrap()]);
        adapter
            .expect_read_current_address()
            .with(eq(InterfaceName::new("wlan0").unwrap()))
            .returning(|_| None);
        let mut spoofer = Spoofer::new(Box::new(adapter), ChangeLedger::open(&path));

        let outcome = spoofer.spoof("eth0", None).unwrap();
        let rows = spoofer.status().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].current, Some(outcome.applied));
        assert_eq!(rows[0].original, Some(mac(ORIGINAL)));
        assert!(rows[0].spoofed);
        assert_eq!(rows[1].current, None);
        assert_eq!(rows[1].original, None);
        assert!(!rows[1].spoofed);

        fs::remove_file(path).unwrap();
    }
}
