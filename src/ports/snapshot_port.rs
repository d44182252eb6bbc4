//! Ledger persistence port trait.

use crate::domain::error::QuantsimError;
use crate::domain::ledger::LedgerSnapshot;

pub trait SnapshotPort {
    /// The stored snapshot, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<LedgerSnapshot>, QuantsimError>;

    /// Replaces any previously stored state.
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), QuantsimError>;
}
