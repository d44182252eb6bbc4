//! Single-file JSON ledger store.

use crate::domain::error::QuantsimError;
use crate::domain::ledger::LedgerSnapshot;
use crate::ports::snapshot_port::SnapshotPort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct JsonSnapshotAdapter {
    path: PathBuf,
}

impl JsonSnapshotAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SnapshotPort for JsonSnapshotAdapter {
    fn load(&self) -> Result<Option<LedgerSnapshot>, QuantsimError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved state");
            return Ok(None);
        }
        debug!(path = %self.path.display(), "loading state");
        let content = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), QuantsimError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Replace atomically via a sibling temp file.
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
