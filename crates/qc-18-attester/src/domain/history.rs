//! Per-validator vote history
//!
//! A fixed-size ring of `target epoch -> source epoch`, addressed by
//! `epoch % period`, plus the highest target ever written. Slots outside
//! `(latest_epoch_written - period, latest_epoch_written]` are stale and
//! must be read through [`crate::domain::protection::safe_target_to_source`].

use super::types::{Epoch, FAR_FUTURE_EPOCH};
use serde::{Deserialize, Serialize};

/// Bounded history of every source/target pair signed by one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochHistory {
    latest_epoch_written: Epoch,
    target_to_source: Vec<Epoch>,
}

impl EpochHistory {
    /// Empty history for a weak-subjectivity period of `period` epochs.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero; configuration validation rejects it first.
    pub fn new(period: u64) -> Self {
        assert!(period > 0, "weak subjectivity period must be non-zero");
        Self {
            latest_epoch_written: 0,
            target_to_source: vec![FAR_FUTURE_EPOCH; period as usize],
        }
    }

    pub fn period(&self) -> u64 {
        self.target_to_source.len() as u64
    }

    pub fn latest_epoch_written(&self) -> Epoch {
        self.latest_epoch_written
    }

    /// True when no vote has ever been recorded.
    pub fn is_empty(&self) -> bool {
        self.latest_epoch_written == 0
            && self.target_to_source.iter().all(|&s| s == FAR_FUTURE_EPOCH)
    }

    /// Raw ring read with no window check.
    pub(crate) fn slot(&self, epoch: Epoch) -> Epoch {
        self.target_to_source[self.index(epoch)]
    }

    pub(crate) fn set_slot(&mut self, epoch: Epoch, source: Epoch) {
        let index = self.index(epoch);
        self.target_to_source[index] = source;
    }

    pub(crate) fn set_latest_epoch_written(&mut self, epoch: Epoch) {
        self.latest_epoch_written = epoch;
    }

    /// Lowest epoch whose ring slot still holds live data, if any is pruned.
    ///
    /// Computed in `i128` so a young history (latest < period) never wraps.
    pub(crate) fn pruned_floor(&self) -> i128 {
        self.latest_epoch_written as i128 - self.period() as i128
    }

    fn index(&self, epoch: Epoch) -> usize {
        (epoch % self.period()) as usize
    }
}
