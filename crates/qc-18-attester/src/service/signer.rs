//! Attestation signing
//!
//! Domain lookup, payload hashing and key custody behind one call.

use crate::domain::{AttestationData, BlsSignature, ValidatorPubkey};
use crate::error::AttesterResult;
use crate::ports::outbound::{BeaconNodeClient, DomainRequest, KeyManager, DOMAIN_BEACON_ATTESTER};
use std::sync::Arc;
use tracing::trace;

/// Signs attestation data for a validator key.
pub struct AttestationSigner<B: ?Sized, K: ?Sized> {
    beacon_node: Arc<B>,
    key_manager: Arc<K>,
}

impl<B, K> AttestationSigner<B, K>
where
    B: BeaconNodeClient + ?Sized,
    K: KeyManager + ?Sized,
{
    pub fn new(beacon_node: Arc<B>, key_manager: Arc<K>) -> Self {
        Self {
            beacon_node,
            key_manager,
        }
    }

    /// Sign `data` under the attester domain of its target epoch.
    ///
    /// Errors from the domain lookup or the key manager are returned as-is.
    pub async fn sign(
        &self,
        pubkey: &ValidatorPubkey,
        data: &AttestationData,
    ) -> AttesterResult<BlsSignature> {
        let domain = self
            .beacon_node
            .domain_data(DomainRequest {
                epoch: data.target.epoch,
                domain: DOMAIN_BEACON_ATTESTER,
            })
            .await?;

        let root = data.hash_root();
        trace!(
            target_epoch = data.target.epoch,
            root = %hex::encode(root),
            "[qc-18] Signing attestation"
        );

        self.key_manager.sign(pubkey, root, domain).await
    }
}
