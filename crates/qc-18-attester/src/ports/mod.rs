//! Ports module for the Attester subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{AttestationReport, AttesterApi, SubmittedVote};
pub use outbound::{
    AttestResponse, AttestationDataRequest, BeaconNodeClient, DomainRequest, DutySource,
    HistoryStore, KeyManager, DOMAIN_BEACON_ATTESTER,
};
