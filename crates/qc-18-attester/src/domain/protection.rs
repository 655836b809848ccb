//! # Slashing Protection
//!
//! Decides whether a new `(source, target)` vote would be slashable against
//! an [`EpochHistory`], and folds accepted votes back into it.
//!
//! ## Rules
//!
//! 1. No double vote: a second vote for a target already voted is rejected,
//!    even with an identical source.
//! 2. No surrounding vote: the new vote may not span an earlier vote whose
//!    source is later than the new source.
//! 3. No surrounded vote: the new vote may not sit inside a later vote whose
//!    source is earlier than the new source.
//!
//! Targets at or below `latest_epoch_written - period` have been pruned and
//! are reported as not slashable: the information needed to say otherwise
//! is gone.

use super::history::EpochHistory;
use super::types::{Epoch, FAR_FUTURE_EPOCH};
use std::fmt;

/// Why a candidate vote was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlashingViolation {
    /// A vote for the same target is already recorded.
    DoubleVote { target: Epoch, existing_source: Epoch },
    /// The candidate would surround the recorded vote for `existing_target`.
    SurroundingVote {
        existing_target: Epoch,
        existing_source: Epoch,
    },
    /// The candidate would be surrounded by the recorded vote for `existing_target`.
    SurroundedVote {
        existing_target: Epoch,
        existing_source: Epoch,
    },
}

impl SlashingViolation {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DoubleVote { .. } => "double_vote",
            Self::SurroundingVote { .. } => "surrounding_vote",
            Self::SurroundedVote { .. } => "surrounded_vote",
        }
    }
}

impl fmt::Display for SlashingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleVote {
                target,
                existing_source,
            } => write!(
                f,
                "double vote for target {} (already voted from source {})",
                target, existing_source
            ),
            Self::SurroundingVote {
                existing_target,
                existing_source,
            } => write!(
                f,
                "surrounds recorded vote {} -> {}",
                existing_source, existing_target
            ),
            Self::SurroundedVote {
                existing_target,
                existing_source,
            } => write!(
                f,
                "surrounded by recorded vote {} -> {}",
                existing_source, existing_target
            ),
        }
    }
}

/// Bounds-checked ring read.
///
/// Returns [`FAR_FUTURE_EPOCH`] for epochs above the watermark or inside the
/// pruned range, so a stale wrapped slot is never mistaken for live data.
pub fn safe_target_to_source(history: &EpochHistory, epoch: Epoch) -> Epoch {
    if epoch > history.latest_epoch_written() || (epoch as i128) <= history.pruned_floor() {
        return FAR_FUTURE_EPOCH;
    }
    history.slot(epoch)
}

/// Classify a candidate vote against the history.
///
/// Checks run in a fixed order: pruned window, double vote, surrounding,
/// surrounded. The first rule that fires is reported.
pub fn check_vote(
    history: &EpochHistory,
    source_epoch: Epoch,
    target_epoch: Epoch,
) -> Option<SlashingViolation> {
    let floor = history.pruned_floor();
    let latest = history.latest_epoch_written();

    // Previously pruned: unknown, treated as safe.
    if (target_epoch as i128) <= floor {
        return None;
    }

    let existing_source = safe_target_to_source(history, target_epoch);
    if existing_source != FAR_FUTURE_EPOCH {
        return Some(SlashingViolation::DoubleVote {
            target: target_epoch,
            existing_source,
        });
    }

    // Epochs below the floor or above the watermark always read as the
    // sentinel, so the scan is clamped to the live window.
    let start = (source_epoch as i128).max(floor + 1) as u64;
    let end = target_epoch.min(latest);
    for epoch in start..=end {
        let recorded = safe_target_to_source(history, epoch);
        if recorded == FAR_FUTURE_EPOCH {
            continue;
        }
        if recorded > source_epoch {
            return Some(SlashingViolation::SurroundingVote {
                existing_target: epoch,
                existing_source: recorded,
            });
        }
    }

    for epoch in target_epoch..=latest {
        let recorded = safe_target_to_source(history, epoch);
        if recorded < source_epoch {
            return Some(SlashingViolation::SurroundedVote {
                existing_target: epoch,
                existing_source: recorded,
            });
        }
    }

    None
}

/// True if signing `(source_epoch, target_epoch)` could get the key slashed.
pub fn is_slashable(history: &EpochHistory, source_epoch: Epoch, target_epoch: Epoch) -> bool {
    check_vote(history, source_epoch, target_epoch).is_some()
}

/// Record a vote that has been submitted.
///
/// When the target moves past the watermark, every epoch in the gap is reset
/// to the sentinel (at most one period's worth), then the watermark advances,
/// then the target slot is written. The order matters: writing first would
/// let the gap reset clobber the new entry.
pub fn mark_attested(
    mut history: EpochHistory,
    source_epoch: Epoch,
    target_epoch: Epoch,
) -> EpochHistory {
    let latest = history.latest_epoch_written();

    if target_epoch > latest {
        let max_to_write = latest.saturating_add(history.period());
        let gap_end = target_epoch.min(max_to_write.saturating_add(1));
        for epoch in (latest + 1)..gap_end {
            history.set_slot(epoch, FAR_FUTURE_EPOCH);
        }
        history.set_latest_epoch_written(target_epoch);
    }

    history.set_slot(target_epoch, source_epoch);
    history
}
