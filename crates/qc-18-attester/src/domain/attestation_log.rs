//! Submitted-attestation log
//!
//! Groups submitted payloads by hash so that a client running many keys can
//! print one line per distinct vote instead of one per key. Nothing here is
//! consulted for safety.
//!
//! Entries live until a later slot flushes them, so the map only ever holds
//! the payloads of slots still in flight.

use super::types::{short_root, Hash, Slot, ValidatorIndex};
use super::vote::AttestationData;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::info;

/// Everyone who signed one exact payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationLogEntry {
    pub data: AttestationData,
    pub attester_indices: Vec<ValidatorIndex>,
}

/// Process-wide annotation map, guarded by its own lock.
#[derive(Debug, Default)]
pub struct AttestationLog {
    entries: Mutex<HashMap<Hash, AttestationLogEntry>>,
}

impl AttestationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `attester_index` signed `data`. Returns the payload hash.
    pub fn record_attester(&self, data: &AttestationData, attester_index: ValidatorIndex) -> Hash {
        let root = data.hash_root();
        let mut entries = self.entries.lock();
        entries
            .entry(root)
            .or_insert_with(|| AttestationLogEntry {
                data: data.clone(),
                attester_indices: Vec::new(),
            })
            .attester_indices
            .push(attester_index);
        root
    }

    pub fn entry(&self, root: &Hash) -> Option<AttestationLogEntry> {
        self.entries.lock().get(root).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Emit one summary line per distinct payload for every slot before
    /// `slot`, removing those entries.
    ///
    /// Returns the number of lines written.
    pub fn log_submitted_before(&self, slot: Slot) -> usize {
        let flushed: Vec<(Hash, AttestationLogEntry)> = {
            let mut entries = self.entries.lock();
            let roots: Vec<Hash> = entries
                .iter()
                .filter(|(_, entry)| entry.data.slot < slot)
                .map(|(root, _)| *root)
                .collect();
            roots
                .into_iter()
                .filter_map(|root| entries.remove(&root).map(|entry| (root, entry)))
                .collect()
        };

        for (root, entry) in &flushed {
            info!(
                attestation_root = %short_root(root),
                slot = entry.data.slot,
                committee_index = entry.data.committee_index,
                source_epoch = entry.data.source.epoch,
                target_epoch = entry.data.target.epoch,
                attester_indices = ?entry.attester_indices,
                "[qc-18] Submitted new attestations"
            );
        }
        flushed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vote::Checkpoint;

    fn data(target: u64) -> AttestationData {
        AttestationData {
            slot: target * 32,
            committee_index: 0,
            beacon_block_root: [1u8; 32],
            source: Checkpoint::new(target - 1, [0u8; 32]),
            target: Checkpoint::new(target, [2u8; 32]),
        }
    }

    #[test]
    fn test_same_payload_groups_indices() {
        let log = AttestationLog::new();
        let root = log.record_attester(&data(5), 11);
        assert_eq!(log.record_attester(&data(5), 12), root);
        log.record_attester(&data(6), 13);

        assert_eq!(log.len(), 2);
        assert_eq!(log.entry(&root).unwrap().attester_indices, vec![11, 12]);
    }

    #[test]
    fn test_flush_keeps_current_slot() {
        let log = AttestationLog::new();
        log.record_attester(&data(5), 1);
        log.record_attester(&data(6), 2);
        let current = log.record_attester(&data(7), 3);

        assert_eq!(log.log_submitted_before(7 * 32), 2);
        assert_eq!(log.len(), 1);
        assert!(log.entry(&current).is_some());
        assert_eq!(log.log_submitted_before(7 * 32), 0);
    }
}
