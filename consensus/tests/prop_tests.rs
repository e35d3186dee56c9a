use proptest::prelude::*;

use halcyon_consensus::{boundary, retarget, DifficultyCalculator};
use halcyon_types::{ChainParams, Difficulty, Header, RetargetParams, U256};

fn mainnet_pow() -> RetargetParams {
    ChainParams::mainnet().pow
}

proptest! {
    /// A block faster than target spacing never lowers difficulty, and no
    /// single step moves it by more than the configured bound.
    #[test]
    fn fast_blocks_raise_within_bound(
        previous in 1_000_000_000u64..u64::MAX,
        delta in 0u32..30,
        start in 0u32..1_000_000,
    ) {
        let params = mainnet_pow();
        let previous = Difficulty::from(previous);
        let next = retarget(start + delta, start, previous, &params);
        let bound = previous * params.max_step_bps / 10_000u64;
        prop_assert!(next >= previous);
        prop_assert!(next - previous <= bound);
    }

    /// A block slower than target spacing never raises difficulty.
    #[test]
    fn slow_blocks_lower_within_bound(
        previous in 1_000_000_000u64..u64::MAX,
        delta in 30u32..100_000,
        start in 0u32..1_000_000,
    ) {
        let params = mainnet_pow();
        let previous = Difficulty::from(previous);
        let next = retarget(start + delta, start, previous, &params);
        let bound = previous * params.max_step_bps / 10_000u64;
        prop_assert!(next <= previous);
        prop_assert!(previous - next <= bound);
    }

    /// Longer intervals never yield a higher difficulty.
    #[test]
    fn difficulty_non_increasing_in_interval(
        previous in any::<u64>(),
        a in 0u32..10_000,
        b in 0u32..10_000,
    ) {
        let params = mainnet_pow();
        let previous = Difficulty::from(previous);
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            retarget(short, 0, previous, &params) >= retarget(long, 0, previous, &params)
        );
    }

    /// The result is never below the network minimum, whatever the input.
    #[test]
    fn never_below_minimum(
        hi in any::<u128>(),
        lo in any::<u128>(),
        current in any::<u32>(),
        previous_time in any::<u32>(),
    ) {
        let params = mainnet_pow();
        let previous = (U256::from(hi) << 128) | U256::from(lo);
        prop_assert!(retarget(current, previous_time, previous, &params) >= params.min_difficulty);
    }

    /// Stake and work rules disagree for an off-target interval.
    #[test]
    fn modes_differ_off_target(
        previous in 1_000_000_000u64..1_000_000_000_000,
        delta in 1u32..29,
    ) {
        let calculator = DifficultyCalculator::new(&ChainParams::mainnet());
        let parent = Header {
            timestamp: 1_000,
            bits: Difficulty::from(previous),
            ..Header::default()
        };
        let child = Header {
            timestamp: 1_000 + delta,
            ..Header::default()
        };
        prop_assert_ne!(
            calculator.calculate(&child, &parent, true),
            calculator.calculate(&child, &parent, false)
        );
    }

    /// Higher difficulty never yields a larger boundary.
    #[test]
    fn boundary_non_increasing_in_difficulty(a in 1u64.., b in 1u64..) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(boundary(&Difficulty::from(high)) <= boundary(&Difficulty::from(low)));
    }
}
