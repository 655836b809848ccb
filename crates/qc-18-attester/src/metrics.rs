//! # Attester Metrics
//!
//! Per-key attestation counters, registered on a registry owned by whoever
//! builds the service.
//!
//! ## Metrics Exported
//!
//! - `validator_successful_attestations` - Counter of completed attempts, by `pkey`
//! - `validator_failed_attestations` - Counter of abandoned attempts, by `pkey`

use crate::domain::ValidatorPubkey;
use crate::error::AttesterResult;
use prometheus::{IntCounterVec, Opts, Registry};

const NAMESPACE: &str = "validator";
const PKEY_LABEL: &str = "pkey";

/// Success/failure counters keyed by truncated validator pubkey.
#[derive(Clone)]
pub struct AttesterMetrics {
    successful_attestations: IntCounterVec,
    failed_attestations: IntCounterVec,
}

impl AttesterMetrics {
    /// Create the counters and register them on `registry`.
    pub fn register(registry: &Registry) -> AttesterResult<Self> {
        let metrics = Self::unregistered()?;
        registry.register(Box::new(metrics.successful_attestations.clone()))?;
        registry.register(Box::new(metrics.failed_attestations.clone()))?;
        Ok(metrics)
    }

    /// Counters that are not exported anywhere.
    pub fn unregistered() -> AttesterResult<Self> {
        Ok(Self {
            successful_attestations: IntCounterVec::new(
                Opts::new("successful_attestations", "Attestations submitted successfully")
                    .namespace(NAMESPACE),
                &[PKEY_LABEL],
            )?,
            failed_attestations: IntCounterVec::new(
                Opts::new("failed_attestations", "Attestation attempts abandoned")
                    .namespace(NAMESPACE),
                &[PKEY_LABEL],
            )?,
        })
    }

    pub fn record_success(&self, pubkey: &ValidatorPubkey) {
        let label = pubkey.short();
        self.successful_attestations
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn record_failure(&self, pubkey: &ValidatorPubkey) {
        let label = pubkey.short();
        self.failed_attestations
            .with_label_values(&[label.as_str()])
            .inc();
    }

    pub fn successes(&self, pubkey: &ValidatorPubkey) -> u64 {
        let label = pubkey.short();
        self.successful_attestations
            .with_label_values(&[label.as_str()])
            .get()
    }

    pub fn failures(&self, pubkey: &ValidatorPubkey) -> u64 {
        let label = pubkey.short();
        self.failed_attestations
            .with_label_values(&[label.as_str()])
            .get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_key() {
        let metrics = AttesterMetrics::unregistered().unwrap();
        let a = ValidatorPubkey::new([1; 48]);
        let b = ValidatorPubkey::new([2; 48]);

        metrics.record_success(&a);
        metrics.record_failure(&b);
        metrics.record_failure(&b);

        assert_eq!(metrics.successes(&a), 1);
        assert_eq!(metrics.failures(&a), 0);
        assert_eq!(metrics.failures(&b), 2);
    }

    #[test]
    fn test_register_exports_families() {
        let registry = Registry::new();
        let metrics = AttesterMetrics::register(&registry).unwrap();
        metrics.record_success(&ValidatorPubkey::new([1; 48]));

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"validator_successful_attestations".to_string()));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        AttesterMetrics::register(&registry).unwrap();
        assert!(AttesterMetrics::register(&registry).is_err());
    }
}
