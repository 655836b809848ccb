//! Committee assignments

use super::types::{CommitteeIndex, ValidatorIndex, ValidatorPubkey};
use crate::error::{AttesterError, AttesterResult};
use serde::{Deserialize, Serialize};

/// Attester assignment for one validator key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorDuty {
    pub pubkey: ValidatorPubkey,
    pub committee_index: CommitteeIndex,
    /// Ordered committee membership.
    pub committee: Vec<ValidatorIndex>,
    pub validator_index: ValidatorIndex,
}

impl ValidatorDuty {
    /// Position of this validator inside its committee.
    pub fn index_in_committee(&self) -> AttesterResult<usize> {
        self.committee
            .iter()
            .position(|&index| index == self.validator_index)
            .ok_or(AttesterError::IndexNotInCommittee {
                validator_index: self.validator_index,
                committee_size: self.committee.len(),
            })
    }
}

/// The current duty set, as refreshed by the duties poller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutySet {
    pub duties: Vec<ValidatorDuty>,
}

impl DutySet {
    pub fn new(duties: Vec<ValidatorDuty>) -> Self {
        Self { duties }
    }

    /// Assignment for `pubkey`, or `NoDuty` if the key was not assigned.
    pub fn duty_for(&self, pubkey: &ValidatorPubkey) -> AttesterResult<&ValidatorDuty> {
        self.duties
            .iter()
            .find(|duty| &duty.pubkey == pubkey)
            .ok_or_else(|| AttesterError::NoDuty { pubkey: *pubkey })
    }

    pub fn len(&self) -> usize {
        self.duties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(key: u8, validator_index: u64, committee: Vec<u64>) -> ValidatorDuty {
        ValidatorDuty {
            pubkey: ValidatorPubkey::new([key; 48]),
            committee_index: 1,
            committee,
            validator_index,
        }
    }

    #[test]
    fn test_duty_lookup_by_pubkey() {
        let set = DutySet::new(vec![duty(1, 10, vec![10]), duty(2, 20, vec![20])]);

        let found = set.duty_for(&ValidatorPubkey::new([2; 48])).unwrap();
        assert_eq!(found.validator_index, 20);

        let missing = set.duty_for(&ValidatorPubkey::new([3; 48]));
        assert!(matches!(missing, Err(AttesterError::NoDuty { .. })));
    }

    #[test]
    fn test_index_in_committee() {
        assert_eq!(duty(1, 7, vec![3, 5, 7, 9]).index_in_committee().unwrap(), 2);

        let err = duty(1, 8, vec![3, 5, 7]).index_in_committee().unwrap_err();
        assert!(matches!(
            err,
            AttesterError::IndexNotInCommittee {
                validator_index: 8,
                committee_size: 3
            }
        ));
    }
}
