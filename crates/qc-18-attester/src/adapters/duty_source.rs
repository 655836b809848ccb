//! Duty set holder
//!
//! Implements `DutySource` for a duty set that the duties poller replaces
//! wholesale each epoch.

use crate::domain::DutySet;
use crate::ports::outbound::DutySource;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Shared, swappable duty set.
#[derive(Default)]
pub struct SharedDutySource {
    duties: RwLock<Option<Arc<DutySet>>>,
}

impl SharedDutySource {
    /// Source with no duties fetched yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duties(duties: DutySet) -> Self {
        Self {
            duties: RwLock::new(Some(Arc::new(duties))),
        }
    }

    /// Replace the current duty set.
    pub fn update(&self, duties: DutySet) {
        debug!("[qc-18] Duty set updated ({} duties)", duties.len());
        *self.duties.write() = Some(Arc::new(duties));
    }

    /// Forget the current duty set.
    pub fn clear(&self) {
        *self.duties.write() = None;
    }
}

impl DutySource for SharedDutySource {
    fn current_duties(&self) -> Option<Arc<DutySet>> {
        self.duties.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ValidatorDuty, ValidatorPubkey};

    #[test]
    fn test_update_and_clear() {
        let source = SharedDutySource::new();
        assert!(source.current_duties().is_none());

        source.update(DutySet::new(vec![ValidatorDuty {
            pubkey: ValidatorPubkey::new([1; 48]),
            committee_index: 0,
            committee: vec![5],
            validator_index: 5,
        }]));
        assert_eq!(source.current_duties().unwrap().len(), 1);

        source.clear();
        assert!(source.current_duties().is_none());
    }

    #[test]
    fn test_snapshot_survives_update() {
        let source = SharedDutySource::with_duties(DutySet::default());
        let snapshot = source.current_duties().unwrap();

        source.update(DutySet::new(Vec::new()));
        assert!(snapshot.is_empty());
    }
}
