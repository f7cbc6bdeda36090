use log::debug;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::ChangeRecord;
use crate::error::{Result, SpoofError};

/// JSON array of change records kept in a single file.
///
/// Every append rewrites the whole document through a sibling temporary
/// file that is renamed into place, so a crash never leaves a half
/// written ledger behind.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record. A missing or blank file is an empty ledger.
    pub fn load(&self) -> Result<Vec<ChangeRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| SpoofError::CorruptLedger {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    pub fn append(&self, record: ChangeRecord) -> Result<()> {
        let mut records = self.load()?;
        records.push(record);
        self.write_atomic(&records)?;
        debug!("Ledger {} now holds {} records", self.path.display(), records.len());
        Ok(())
    }

    fn write_atomic(&self, records: &[ChangeRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(records)
            .map_err(|e| SpoofError::Other(e.into()))?;

        let tmp = self.temp_path();
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(body.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
pub(crate) fn scratch_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "macspoof-{}-{}-{:016x}.json",
        tag,
        std::process::id(),
        rand::random::<u64>()
    ))
}
