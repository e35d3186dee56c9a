//! Per-block difficulty retargeting.
//!
//! The step is proportional to `previous / adjustment_divisor`, scaled by how
//! far the block interval strays from the target spacing, and capped at
//! `max_step_bps` of the previous difficulty. Intermediate products are
//! computed in 512 bits so every node reaches the same integer.

use halcyon_types::{ChainParams, Difficulty, Header, RetargetParams, U256, U512};

/// Denominator of [`RetargetParams::max_step_bps`].
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Retargets difficulty from two consecutive headers.
#[derive(Clone, Debug)]
pub struct DifficultyCalculator {
    pow: RetargetParams,
    pos: RetargetParams,
}

impl DifficultyCalculator {
    pub fn new(params: &ChainParams) -> Self {
        Self {
            pow: params.pow,
            pos: params.pos,
        }
    }

    pub fn params(&self, is_staking: bool) -> &RetargetParams {
        if is_staking {
            &self.pos
        } else {
            &self.pow
        }
    }

    /// Difficulty `current` must carry given its parent `previous`.
    pub fn calculate(&self, current: &Header, previous: &Header, is_staking: bool) -> Difficulty {
        retarget(
            current.timestamp,
            previous.timestamp,
            previous.bits,
            self.params(is_staking),
        )
    }
}

/// Next difficulty after a block interval of `current_time - previous_time`.
///
/// A non-positive interval is treated as one second.
pub fn retarget(
    current_time: u32,
    previous_time: u32,
    previous: Difficulty,
    params: &RetargetParams,
) -> Difficulty {
    let delta = u64::from(current_time.saturating_sub(previous_time)).max(1);
    let spacing = params.target_spacing.max(1);
    let quantum = previous / U256::from(params.adjustment_divisor.max(1));
    let bound = mul_div(
        previous,
        U256::from(params.max_step_bps),
        U256::from(BPS_DENOMINATOR),
    );

    let next = if delta < spacing {
        let raise = mul_div(quantum, U256::from(spacing - delta), U256::from(spacing));
        previous.saturating_add(raise.min(bound))
    } else {
        let cut = mul_div(quantum, U256::from(delta - spacing), U256::from(spacing));
        previous.saturating_sub(cut.min(bound))
    };
    next.max(params.min_difficulty)
}

/// `a * b / d` without intermediate overflow, saturating at `U256::MAX`.
fn mul_div(a: U256, b: U256, d: U256) -> U256 {
    let wide = a.full_mul(b) / U512::from(d);
    U256::try_from(wide).unwrap_or(U256::MAX)
}
