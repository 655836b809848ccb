//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Everything the attester needs from the outside world: the duty poller,
//! the beacon node, the key manager and durable history storage.

use crate::domain::{
    Attestation, AttestationData, BlsSignature, CommitteeIndex, DutySet, Epoch, EpochHistory, Hash,
    Slot, ValidatorPubkey,
};
use crate::error::AttesterResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Signature domain type for attestations.
pub const DOMAIN_BEACON_ATTESTER: [u8; 4] = [1, 0, 0, 0];

/// Request for vote data at a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttestationDataRequest {
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
}

/// Request for a signature domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainRequest {
    pub epoch: Epoch,
    pub domain: [u8; 4],
}

/// Beacon node acknowledgement of a submitted attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttestResponse {
    pub attestation_data_root: Hash,
}

/// Source of the current duty set.
///
/// The set is refreshed out-of-band; `None` means it has never been fetched.
pub trait DutySource: Send + Sync {
    fn current_duties(&self) -> Option<Arc<DutySet>>;
}

/// Beacon node RPC used during an attestation attempt.
#[async_trait]
pub trait BeaconNodeClient: Send + Sync {
    /// Vote data for a slot and committee. May be called repeatedly.
    async fn get_attestation_data(
        &self,
        request: AttestationDataRequest,
    ) -> AttesterResult<AttestationData>;

    /// Signature domain for an epoch and domain type.
    async fn domain_data(&self, request: DomainRequest) -> AttesterResult<Hash>;

    /// Broadcast a signed attestation.
    async fn propose_attestation(&self, attestation: &Attestation)
        -> AttesterResult<AttestResponse>;
}

/// Key custody: signs a payload root under a domain.
#[async_trait]
pub trait KeyManager: Send + Sync {
    async fn sign(
        &self,
        pubkey: &ValidatorPubkey,
        root: Hash,
        domain: Hash,
    ) -> AttesterResult<BlsSignature>;
}

/// Durable per-key slashing protection history.
///
/// `load` never fails for an unknown key: it returns an empty history.
/// `save` fully replaces the previous record or leaves it intact.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self, pubkey: &ValidatorPubkey) -> AttesterResult<EpochHistory>;

    async fn save(&self, pubkey: &ValidatorPubkey, history: &EpochHistory) -> AttesterResult<()>;
}
