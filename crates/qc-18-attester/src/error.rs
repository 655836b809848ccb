//! Error types for the Attester subsystem

use crate::domain::{Epoch, SlashingViolation, ValidatorIndex, ValidatorPubkey};
use std::fmt;
use thiserror::Error;

/// Attester subsystem errors
#[derive(Debug, Error)]
pub enum AttesterError {
    /// The duty set has not been fetched yet
    #[error("No duties for validators")]
    NoDuties,

    /// Key has no assignment in the current duty set
    #[error("Pubkey {pubkey} not in duties")]
    NoDuty { pubkey: ValidatorPubkey },

    /// Validator index missing from its own committee
    #[error("Validator index {validator_index} not found in committee of size {committee_size}")]
    IndexNotInCommittee {
        validator_index: ValidatorIndex,
        committee_size: usize,
    },

    /// Beacon node request failed
    #[error("Beacon node request failed: {0}")]
    BeaconNode(String),

    /// Key manager could not sign
    #[error("Key manager error: {0}")]
    KeyManager(String),

    /// Protection history could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Candidate vote rejected by slashing protection
    #[error("Attempted slashable attestation {source_epoch} -> {target_epoch}: {violation}")]
    SlashableVote {
        source_epoch: Epoch,
        target_epoch: Epoch,
        violation: SlashingViolation,
    },

    /// History commit failed after the vote was already submitted
    #[error("Could not persist protection history after submission: {reason}")]
    ProtectionPersist { reason: String },

    /// The calling context cancelled the attempt
    #[error("Attestation attempt cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Logging could not be initialised
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Metrics could not be registered
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Coarse failure classes used for log severity and accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    TransientIo,
    SlashableVote,
    DataIntegrity,
    ProtectionPersist,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::TransientIo => "transient_io",
            Self::SlashableVote => "slashable_vote",
            Self::DataIntegrity => "data_integrity",
            Self::ProtectionPersist => "protection_persist",
        }
    }
}

impl AttesterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoDuties | Self::Config(_) | Self::Telemetry(_) | Self::Metrics(_) => {
                ErrorCategory::Configuration
            }
            Self::BeaconNode(_) | Self::KeyManager(_) | Self::Storage(_) | Self::Cancelled => {
                ErrorCategory::TransientIo
            }
            Self::SlashableVote { .. } => ErrorCategory::SlashableVote,
            Self::NoDuty { .. } | Self::IndexNotInCommittee { .. } => ErrorCategory::DataIntegrity,
            Self::ProtectionPersist { .. } => ErrorCategory::ProtectionPersist,
        }
    }
}

/// Result type for attester operations
pub type AttesterResult<T> = Result<T, AttesterError>;

/// States of a single attestation attempt.
///
/// ```text
/// Start → DutyResolved → DataFetched → ProtectionChecked → Signed
///       → Submitted → ProtectionCommitted → Done
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptStage {
    Start,
    DutyResolved,
    DataFetched,
    ProtectionChecked,
    Signed,
    Submitted,
    ProtectionCommitted,
    Done,
}

impl fmt::Display for AttemptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::DutyResolved => "duty_resolved",
            Self::DataFetched => "data_fetched",
            Self::ProtectionChecked => "protection_checked",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::ProtectionCommitted => "protection_committed",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// An abandoned attempt: the last stage reached and why it stopped.
#[derive(Debug, Error)]
#[error("attestation attempt failed after {stage}: {error}")]
pub struct AttemptFailure {
    pub stage: AttemptStage,
    #[source]
    pub error: AttesterError,
}

impl AttemptFailure {
    pub fn new(stage: AttemptStage, error: AttesterError) -> Self {
        Self { stage, error }
    }

    pub fn category(&self) -> ErrorCategory {
        self.error.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(AttesterError::NoDuties.category(), ErrorCategory::Configuration);
        assert_eq!(
            AttesterError::NoDuty {
                pubkey: ValidatorPubkey::new([0; 48])
            }
            .category(),
            ErrorCategory::DataIntegrity
        );
        assert_eq!(
            AttesterError::BeaconNode("timeout".into()).category(),
            ErrorCategory::TransientIo
        );
        assert_eq!(
            AttesterError::ProtectionPersist {
                reason: "disk full".into()
            }
            .category(),
            ErrorCategory::ProtectionPersist
        );
    }

    #[test]
    fn test_failure_display_names_stage() {
        let failure = AttemptFailure::new(AttemptStage::DataFetched, AttesterError::Cancelled);
        assert_eq!(
            failure.to_string(),
            "attestation attempt failed after data_fetched: Attestation attempt cancelled"
        );
    }
}
