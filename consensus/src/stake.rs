//! Proof-of-stake acceptance.
//!
//! A stake block replaces the dataset evaluation with [`hash_head_pos`],
//! compared against the header's boundary scaled by the weight of the staked
//! output.

use halcyon_types::{Header, StakeOutput, StakeRules, U256};
use tracing::debug;

use crate::hashing::{boundary, hash_head_pos};
use crate::verdict::{RejectReason, Verdict};

/// Weight of an output worth `value` base units, in `1..=weight_cap`.
pub fn stake_weight(rules: &StakeRules, value: u64) -> u64 {
    let cap = rules.weight_cap.max(1);
    (value / rules.stake_unit.max(1)).clamp(1, cap)
}

/// Value the stake hash must stay below.
pub fn stake_target(header: &Header, rules: &StakeRules, value: u64) -> U256 {
    let weight = stake_weight(rules, value);
    boundary(&header.bits)
        .to_u256()
        .saturating_mul(U256::from(weight))
}

/// Check that `header` is validly sealed by staking `stake`.
pub fn verify_stake(rules: &StakeRules, header: &Header, stake: &StakeOutput) -> Verdict {
    let Some(point) = header.stake else {
        return Verdict::Rejected(RejectReason::MissingStake);
    };
    if point != stake.point {
        return Verdict::Rejected(RejectReason::StakeMismatch);
    }

    let confirmations = stake.confirmations_at(header.number);
    if confirmations < rules.min_confirmations {
        return Verdict::Rejected(RejectReason::StakeImmature {
            confirmations,
            required: rules.min_confirmations,
        });
    }
    if stake.value < rules.min_value {
        return Verdict::Rejected(RejectReason::StakeTooSmall {
            value: stake.value,
            required: rules.min_value,
        });
    }

    let hash = hash_head_pos(header, stake);
    if hash.to_u256() < stake_target(header, rules, stake.value) {
        Verdict::Accepted
    } else {
        debug!(number = header.number, %hash, "stake hash above target");
        Verdict::Rejected(RejectReason::StakeAboveTarget)
    }
}
