//! Driving Ports (API - Inbound)

use crate::domain::{Attestation, Hash, Slot, ValidatorPubkey};
use crate::error::AttemptFailure;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One vote that made it to the beacon node.
#[derive(Clone, Debug)]
pub struct SubmittedVote {
    pub attestation: Attestation,
    /// Root acknowledged by the beacon node
    pub response_root: Hash,
}

/// Result of a completed attempt.
#[derive(Clone, Debug)]
pub struct AttestationReport {
    pub pubkey: ValidatorPubkey,
    pub slot: Slot,
    pub submitted: Vec<SubmittedVote>,
    /// Whether the protection history was updated
    pub protection_committed: bool,
}

/// Primary Attester API
///
/// Runs the full attester duty for one key at one slot: resolve duty,
/// fetch vote data, check protection, sign, submit, record.
#[async_trait]
pub trait AttesterApi: Send + Sync {
    /// Perform the attester duty.
    ///
    /// Failures are logged and counted before being returned; nothing is
    /// retried. Cancelling `cancel` stops the attempt before any signature
    /// is produced or submitted.
    async fn submit_attestation(
        &self,
        slot: Slot,
        pubkey: ValidatorPubkey,
        cancel: &CancellationToken,
    ) -> Result<AttestationReport, AttemptFailure>;

    /// Flip slashing protection on or off. Read once per attempt.
    fn set_protection_enabled(&self, enabled: bool);

    fn protection_enabled(&self) -> bool;
}
