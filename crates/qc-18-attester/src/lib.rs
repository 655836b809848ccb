//! # qc-18-attester
//!
//! Attester duty for a validator client, guarded by slashing protection.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Slashing Protection**: Bounded ring of `target -> source` epochs per key,
//!   with double, surrounding and surrounded vote detection
//! - **Attestation Signing**: Domain-separated signing through the key manager
//! - **Attester Duty**: Fetch, check, sign, submit, record, with per-key
//!   mutual exclusion
//!
//! ## Architecture
//!
//! ```text
//! Duty poller ──DutySet──→ Attester (18) ──get_attestation_data──→ Beacon Node
//!                              │
//!                              ├── check_vote / mark_attested ──→ HistoryStore
//!                              ├── sign ──→ Key Manager
//!                              └── propose_attestation ──→ Beacon Node
//! ```
//!
//! ## Safety Contract
//!
//! - A vote is never signed without a protection check against the stored
//!   history (when protection is enabled).
//! - The history never records a vote that was not submitted.
//! - A history write that fails after submission is logged as critical;
//!   the vote cannot be recalled.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_attester::{AttesterApi, AttesterConfig, AttesterMetrics, AttesterService};
//! use qc_18_attester::adapters::{InMemoryHistoryStore, SharedDutySource};
//!
//! let config = AttesterConfig::from_env()?;
//! let service = AttesterService::new(
//!     config.clone(),
//!     Arc::new(SharedDutySource::new()),
//!     beacon_node,
//!     key_manager,
//!     Arc::new(InMemoryHistoryStore::new(config.weak_subjectivity_period)?),
//!     AttesterMetrics::register(&registry)?,
//! );
//!
//! let report = service.submit_attestation(slot, pubkey, &cancel).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

pub use config::{AttesterConfig, CandidateMode, LoggingConfig};
pub use domain::{
    check_vote, is_slashable, mark_attested, safe_target_to_source, Attestation,
    AttestationData, AttestationLog, BlsSignature, Checkpoint, DutySet, Epoch, EpochHistory,
    SlashingViolation, Slot, ValidatorDuty, ValidatorPubkey, FAR_FUTURE_EPOCH,
};
pub use error::{AttemptFailure, AttemptStage, AttesterError, AttesterResult, ErrorCategory};
pub use metrics::AttesterMetrics;
pub use ports::inbound::{AttestationReport, AttesterApi, SubmittedVote};
pub use ports::outbound::{BeaconNodeClient, DutySource, HistoryStore, KeyManager};
pub use service::{AttestationSigner, AttesterService};
