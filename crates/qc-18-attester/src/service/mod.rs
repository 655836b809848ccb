//! Attester Service - the attester duty for one key at one slot
//!
//! ```text
//! Start → DutyResolved → DataFetched → ProtectionChecked → Signed
//!       → Submitted → ProtectionCommitted → Done
//! ```
//!
//! Every arrow can short-circuit to a failure. Nothing is retried: a caller
//! that wants another go re-invokes the whole sequence, and the protection
//! check runs again from scratch.

mod key_locks;
mod signer;


pub use key_locks::KeyLocks;
pub use signer::AttestationSigner;

use crate::config::{AttesterConfig, CandidateMode};
use crate::domain::{
    check_vote, mark_attested, short_root, Attestation, AttestationData, AttestationLog,
    CommitteeIndex, Slot, ValidatorDuty, ValidatorPubkey,
};
use crate::error::{AttemptFailure, AttemptStage, AttesterError, AttesterResult, ErrorCategory};
use crate::metrics::AttesterMetrics;
use crate::ports::inbound::{AttestationReport, AttesterApi, SubmittedVote};
use crate::ports::outbound::{
    AttestationDataRequest, BeaconNodeClient, DutySource, HistoryStore, KeyManager,
};
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

/// Attester service implementation
pub struct AttesterService<D, B, K, H>
where
    D: DutySource + ?Sized,
    B: BeaconNodeClient + ?Sized,
    K: KeyManager + ?Sized,
    H: HistoryStore + ?Sized,
{
    config: AttesterConfig,
    protect_attester: AtomicBool,
    duties: Arc<D>,
    beacon_node: Arc<B>,
    signer: AttestationSigner<B, K>,
    history: Arc<H>,
    metrics: AttesterMetrics,
    attestation_log: Arc<AttestationLog>,
    key_locks: KeyLocks,
}

impl<D, B, K, H> AttesterService<D, B, K, H>
where
    D: DutySource + ?Sized,
    B: BeaconNodeClient + ?Sized,
    K: KeyManager + ?Sized,
    H: HistoryStore + ?Sized,
{
    /// Create new attester service
    pub fn new(
        config: AttesterConfig,
        duties: Arc<D>,
        beacon_node: Arc<B>,
        key_manager: Arc<K>,
        history: Arc<H>,
        metrics: AttesterMetrics,
    ) -> Self {
        Self {
            protect_attester: AtomicBool::new(config.protect_attester),
            config,
            duties,
            signer: AttestationSigner::new(Arc::clone(&beacon_node), key_manager),
            beacon_node,
            history,
            metrics,
            attestation_log: Arc::new(AttestationLog::new()),
            key_locks: KeyLocks::new(),
        }
    }

    /// Share a process-wide attestation log instead of a private one.
    pub fn with_attestation_log(mut self, attestation_log: Arc<AttestationLog>) -> Self {
        self.attestation_log = attestation_log;
        self
    }

    pub fn attestation_log(&self) -> &Arc<AttestationLog> {
        &self.attestation_log
    }

    pub fn metrics(&self) -> &AttesterMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &AttesterConfig {
        &self.config
    }

    async fn run_attempt(
        &self,
        slot: Slot,
        pubkey: ValidatorPubkey,
        cancel: &CancellationToken,
    ) -> Result<AttestationReport, AttemptFailure> {
        let mut stage = AttemptStage::Start;
        let at = |stage: AttemptStage| move |error: AttesterError| AttemptFailure::new(stage, error);

        let _guard = cancellable(cancel, async { Ok(self.key_locks.acquire(&pubkey).await) })
            .await
            .map_err(at(stage))?;
        let protect = self.protect_attester.load(Ordering::Acquire);

        // 1. Resolve duty
        let duty = self.resolve_duty(&pubkey).map_err(at(stage))?;
        stage = AttemptStage::DutyResolved;

        // 2. Fetch candidate votes
        let candidates = self
            .fetch_candidates(slot, duty.committee_index, cancel)
            .await
            .map_err(at(stage))?;
        stage = AttemptStage::DataFetched;

        // 3. Slashing protection
        if protect {
            self.check_candidates(&pubkey, &candidates, cancel)
                .await
                .map_err(at(stage))?;
        }
        stage = AttemptStage::ProtectionChecked;

        // 4. Sign every candidate before anything leaves the process
        let mut signatures = Vec::with_capacity(candidates.len());
        for data in &candidates {
            let signature = cancellable(cancel, self.signer.sign(&pubkey, data))
                .await
                .map_err(at(stage))?;
            signatures.push(signature);
        }
        stage = AttemptStage::Signed;

        // 5-6. Locate committee position and assemble
        let position = duty.index_in_committee().map_err(at(stage))?;
        let attestations: Vec<Attestation> = candidates
            .into_iter()
            .zip(signatures)
            .map(|(data, signature)| {
                Attestation::single(data, duty.committee.len(), position, signature)
            })
            .collect();

        // 7. Submit
        if cancel.is_cancelled() {
            return Err(at(stage)(AttesterError::Cancelled));
        }
        let (submitted, submit_error) = self.submit_all(attestations).await;
        if submitted.is_empty() {
            if let Some(e) = submit_error {
                return Err(at(stage)(e));
            }
        }
        stage = AttemptStage::Submitted;

        // 8. Commit what actually went out, even if a later submission failed
        if protect {
            self.commit_history(&pubkey, &submitted)
                .await
                .map_err(at(stage))?;
        }
        if let Some(e) = submit_error {
            return Err(at(stage)(e));
        }
        stage = AttemptStage::ProtectionCommitted;

        // 9. Annotate for the per-slot summary
        for vote in &submitted {
            self.attestation_log
                .record_attester(&vote.attestation.data, duty.validator_index);
        }
        debug!(%stage, "[qc-18] Attestation attempt complete");

        Ok(AttestationReport {
            pubkey,
            slot,
            submitted,
            protection_committed: protect,
        })
    }

    fn resolve_duty(&self, pubkey: &ValidatorPubkey) -> AttesterResult<ValidatorDuty> {
        let duties = self
            .duties
            .current_duties()
            .ok_or(AttesterError::NoDuties)?;
        duties.duty_for(pubkey).cloned()
    }

    /// Fetch vote data; in divergent mode, keep fetching a second candidate
    /// until its source epoch differs from the first.
    async fn fetch_candidates(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
        cancel: &CancellationToken,
    ) -> AttesterResult<Vec<AttestationData>> {
        let request = AttestationDataRequest {
            slot,
            committee_index,
        };

        let first = cancellable(cancel, self.beacon_node.get_attestation_data(request)).await?;
        if self.config.candidate_mode == CandidateMode::Single {
            return Ok(vec![first]);
        }

        let mut second = first.clone();
        let mut fetches: u64 = 0;
        while second.source.epoch == first.source.epoch {
            // A beacon node that answers immediately must not starve the
            // task that would cancel us.
            tokio::task::yield_now().await;
            second = cancellable(cancel, self.beacon_node.get_attestation_data(request)).await?;
            fetches += 1;
        }
        debug!(
            fetches,
            first_source = first.source.epoch,
            second_source = second.source.epoch,
            "[qc-18] Fetched divergent candidate"
        );

        Ok(vec![first, second])
    }

    async fn check_candidates(
        &self,
        pubkey: &ValidatorPubkey,
        candidates: &[AttestationData],
        cancel: &CancellationToken,
    ) -> AttesterResult<()> {
        let history = cancellable(cancel, self.history.load(pubkey)).await?;

        for data in candidates {
            if let Some(violation) = check_vote(&history, data.source.epoch, data.target.epoch) {
                return Err(AttesterError::SlashableVote {
                    source_epoch: data.source.epoch,
                    target_epoch: data.target.epoch,
                    violation,
                });
            }
        }
        Ok(())
    }

    /// Submit in order, stopping at the first error.
    async fn submit_all(
        &self,
        attestations: Vec<Attestation>,
    ) -> (Vec<SubmittedVote>, Option<AttesterError>) {
        let mut submitted = Vec::with_capacity(attestations.len());

        for (n, attestation) in attestations.into_iter().enumerate() {
            match self.beacon_node.propose_attestation(&attestation).await {
                Ok(response) => {
                    info!(
                        candidate = n + 1,
                        response_root = %short_root(&response.attestation_data_root),
                        source_epoch = attestation.data.source.epoch,
                        target_epoch = attestation.data.target.epoch,
                        "[qc-18] ✅ Successfully submitted attestation"
                    );
                    submitted.push(SubmittedVote {
                        attestation,
                        response_root: response.attestation_data_root,
                    });
                }
                Err(e) => return (submitted, Some(e)),
            }
        }
        (submitted, None)
    }

    /// Reload, fold in every submitted vote, persist.
    async fn commit_history(
        &self,
        pubkey: &ValidatorPubkey,
        submitted: &[SubmittedVote],
    ) -> AttesterResult<()> {
        let persist = |e: AttesterError| AttesterError::ProtectionPersist {
            reason: e.to_string(),
        };

        let history = self.history.load(pubkey).await.map_err(persist)?;
        let history = submitted.iter().fold(history, |history, vote| {
            let data = &vote.attestation.data;
            mark_attested(history, data.source.epoch, data.target.epoch)
        });
        self.history.save(pubkey, &history).await.map_err(persist)
    }

    fn report_failure(&self, pubkey: &ValidatorPubkey, failure: &AttemptFailure) {
        let stage = failure.stage;
        let category = failure.category().as_str();

        match &failure.error {
            AttesterError::SlashableVote {
                source_epoch,
                target_epoch,
                violation,
            } => error!(
                %stage,
                category,
                source_epoch,
                target_epoch,
                violation = violation.kind(),
                "[qc-18] 🚫 Attempted to make a slashable attestation, rejected"
            ),
            AttesterError::ProtectionPersist { reason } => error!(
                %stage,
                category,
                critical = true,
                reason = %reason,
                "[qc-18] 🚨 Vote submitted but protection history NOT saved"
            ),
            e if failure.category() == ErrorCategory::DataIntegrity => error!(
                %stage,
                category,
                error = %e,
                "[qc-18] Duty and committee data disagree"
            ),
            e => error!(
                %stage,
                category,
                error = %e,
                "[qc-18] Attestation attempt abandoned"
            ),
        }

        if self.config.emit_account_metrics {
            self.metrics.record_failure(pubkey);
        }
    }
}

#[async_trait]
impl<D, B, K, H> AttesterApi for AttesterService<D, B, K, H>
where
    D: DutySource + ?Sized,
    B: BeaconNodeClient + ?Sized,
    K: KeyManager + ?Sized,
    H: HistoryStore + ?Sized,
{
    async fn submit_attestation(
        &self,
        slot: Slot,
        pubkey: ValidatorPubkey,
        cancel: &CancellationToken,
    ) -> Result<AttestationReport, AttemptFailure> {
        let span = info_span!("attestation", pubkey = %pubkey, slot);

        async move {
            self.attestation_log.log_submitted_before(slot);

            let result = self.run_attempt(slot, pubkey, cancel).await;
            match &result {
                Ok(_) => {
                    if self.config.emit_account_metrics {
                        self.metrics.record_success(&pubkey);
                    }
                }
                Err(failure) => self.report_failure(&pubkey, failure),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn set_protection_enabled(&self, enabled: bool) {
        self.protect_attester.store(enabled, Ordering::Release);
    }

    fn protection_enabled(&self) -> bool {
        self.protect_attester.load(Ordering::Acquire)
    }
}

/// Race `future` against cancellation.
async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> AttesterResult<T>
where
    F: Future<Output = AttesterResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AttesterError::Cancelled),
        result = future => result,
    }
}
