#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use halcyon_consensus::retarget;
use halcyon_types::{Difficulty, RetargetParams};

#[derive(Debug, Arbitrary)]
struct Input {
    previous: [u8; 32],
    current_time: u32,
    previous_time: u32,
    target_spacing: u64,
    adjustment_divisor: u64,
    max_step_bps: u32,
    min_difficulty: u64,
}

// Retargeting must produce a value for any parent difficulty, clock skew or
// parameter set, never below the minimum and never panicking.
fuzz_target!(|input: Input| {
    let params = RetargetParams {
        target_spacing: input.target_spacing,
        adjustment_divisor: input.adjustment_divisor,
        max_step_bps: input.max_step_bps,
        min_difficulty: Difficulty::from(input.min_difficulty),
    };
    let previous = Difficulty::from_big_endian(&input.previous);
    let next = retarget(input.current_time, input.previous_time, previous, &params);
    assert!(next >= params.min_difficulty);
});
