//! Domain module for the Attester subsystem
//!
//! ## Core Modules
//! - types: Keys, epochs and the far-future sentinel
//! - vote: Attestation payloads and their structural hash
//! - history: Bounded per-key vote history
//! - protection: Double/surround vote detection and history updates
//! - duty: Committee assignments
//! - attestation_log: Per-payload submission log

pub mod attestation_log;
pub mod duty;
pub mod history;
pub mod protection;
pub mod types;
pub mod vote;

pub use attestation_log::{AttestationLog, AttestationLogEntry};
pub use duty::{DutySet, ValidatorDuty};
pub use history::EpochHistory;
pub use protection::{
    check_vote, is_slashable, mark_attested, safe_target_to_source, SlashingViolation,
};
pub use types::{
    short_root, CommitteeIndex, Epoch, Hash, Slot, ValidatorIndex, ValidatorPubkey,
    FAR_FUTURE_EPOCH, PUBKEY_LEN,
};
pub use vote::{AggregationBits, Attestation, AttestationData, BlsSignature, Checkpoint};
