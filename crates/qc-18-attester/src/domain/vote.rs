//! Attestation payloads
//!
//! `AttestationData` is the candidate vote fetched from the beacon node;
//! `Attestation` is what gets submitted once it has been signed.

use super::types::{CommitteeIndex, Epoch, Hash, Slot};
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Aggregation bitfield: one bit per committee member.
pub type AggregationBits = BitVec<u8, Lsb0>;

/// Epoch boundary referenced by a vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Hash,
}

impl Checkpoint {
    pub fn new(epoch: Epoch, root: Hash) -> Self {
        Self { epoch, root }
    }

    fn hash_root(&self) -> Hash {
        hash_pair(&u64_chunk(self.epoch), &self.root)
    }
}

/// Vote data for one slot and committee.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
    pub beacon_block_root: Hash,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

impl AttestationData {
    pub fn source_epoch(&self) -> Epoch {
        self.source.epoch
    }

    pub fn target_epoch(&self) -> Epoch {
        self.target.epoch
    }

    /// Deterministic structural hash of the payload.
    ///
    /// Each field becomes a 32-byte leaf (checkpoints are two-leaf subtrees)
    /// and the leaves are merkleized with SHA-256, zero-padded to a power of
    /// two. Any change to any field changes the root.
    pub fn hash_root(&self) -> Hash {
        let leaves = [
            u64_chunk(self.slot),
            u64_chunk(self.committee_index),
            self.beacon_block_root,
            self.source.hash_root(),
            self.target.hash_root(),
        ];
        merkleize(&leaves)
    }
}

/// Serialized BLS signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlsSignature(pub Vec<u8>);

impl BlsSignature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A signed, single-participant attestation ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attestation {
    pub data: AttestationData,
    pub aggregation_bits: AggregationBits,
    pub signature: BlsSignature,
}

impl Attestation {
    /// Build an attestation with only `position` set in a bitfield of
    /// `committee_size` bits.
    pub fn single(
        data: AttestationData,
        committee_size: usize,
        position: usize,
        signature: BlsSignature,
    ) -> Self {
        let mut aggregation_bits = bitvec![u8, Lsb0; 0; committee_size];
        if position < committee_size {
            aggregation_bits.set(position, true);
        }
        Self {
            data,
            aggregation_bits,
            signature,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.aggregation_bits.count_ones()
    }
}

fn u64_chunk(value: u64) -> Hash {
    let mut chunk = [0u8; 32];
    chunk[..8].copy_from_slice(&value.to_le_bytes());
    chunk
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn merkleize(leaves: &[Hash]) -> Hash {
    let width = leaves.len().next_power_of_two();
    let mut layer: Vec<Hash> = leaves.to_vec();
    layer.resize(width, [0u8; 32]);

    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    layer[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> AttestationData {
        AttestationData {
            slot: 64,
            committee_index: 3,
            beacon_block_root: [9u8; 32],
            source: Checkpoint::new(1, [1u8; 32]),
            target: Checkpoint::new(2, [2u8; 32]),
        }
    }

    #[test]
    fn test_hash_root_is_deterministic() {
        assert_eq!(sample_data().hash_root(), sample_data().hash_root());
    }

    #[test]
    fn test_hash_root_covers_every_field() {
        let base = sample_data().hash_root();

        let mut data = sample_data();
        data.slot += 1;
        assert_ne!(data.hash_root(), base);

        let mut data = sample_data();
        data.committee_index += 1;
        assert_ne!(data.hash_root(), base);

        let mut data = sample_data();
        data.beacon_block_root[31] ^= 1;
        assert_ne!(data.hash_root(), base);

        let mut data = sample_data();
        data.source.epoch += 1;
        assert_ne!(data.hash_root(), base);

        let mut data = sample_data();
        data.target.root[0] ^= 1;
        assert_ne!(data.hash_root(), base);
    }

    #[test]
    fn test_swapping_checkpoints_changes_root() {
        let mut swapped = sample_data();
        std::mem::swap(&mut swapped.source, &mut swapped.target);
        assert_ne!(swapped.hash_root(), sample_data().hash_root());
    }

    #[test]
    fn test_single_participant_bitfield() {
        let att = Attestation::single(sample_data(), 10, 4, BlsSignature::default());

        assert_eq!(att.aggregation_bits.len(), 10);
        assert_eq!(att.participant_count(), 1);
        assert!(att.aggregation_bits[4]);
        assert!(!att.aggregation_bits[3]);
    }
}
