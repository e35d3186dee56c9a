//! Per-network consensus constants.
//!
//! Every value here is consensus-critical: two nodes that disagree on any of
//! them will fork. They are fixed per [`NetworkId`] and never change at runtime.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, NetworkId};

/// Base units per coin.
pub const COIN: u64 = 100_000_000;

/// Growth schedule for the per-epoch dataset sizes, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSchedule {
    /// Verification dataset size at epoch 0 (before prime rounding).
    pub cache_init: u64,
    /// Verification dataset growth per epoch.
    pub cache_growth: u64,
    /// Mining dataset size at epoch 0 (before prime rounding).
    pub dataset_init: u64,
    /// Mining dataset growth per epoch.
    pub dataset_growth: u64,
}

impl SizeSchedule {
    /// The reference memory-hard schedule: 16 MiB + 128 KiB/epoch light,
    /// 1 GiB + 8 MiB/epoch full.
    pub const MAINNET: Self = Self {
        cache_init: 1 << 24,
        cache_growth: 1 << 17,
        dataset_init: 1 << 30,
        dataset_growth: 1 << 23,
    };
}

/// Retarget constants for one block kind (proof-of-work or proof-of-stake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetargetParams {
    /// Desired seconds between consecutive blocks of this kind.
    pub target_spacing: u64,
    /// The adjustment quantum is `previous difficulty / adjustment_divisor`.
    pub adjustment_divisor: u64,
    /// Largest change a single retarget may apply, in basis points of the
    /// previous difficulty.
    pub max_step_bps: u32,
    /// Retarget results are floored here.
    pub min_difficulty: Difficulty,
}

/// Rules an output must satisfy to be used as proof-of-stake weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRules {
    /// Blocks that must separate the output's confirmation and the staking block.
    pub min_confirmations: u64,
    /// Smallest output value accepted as stake.
    pub min_value: u64,
    /// Base units that make up one unit of stake weight.
    pub stake_unit: u64,
    /// Upper bound on the weight a single output contributes.
    pub weight_cap: u64,
}

/// Consensus constants for one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub network: NetworkId,
    /// Blocks per epoch.
    pub epoch_length: u64,
    pub sizes: SizeSchedule,
    pub pow: RetargetParams,
    pub pos: RetargetParams,
    pub stake: StakeRules,
}

impl ChainParams {
    pub fn mainnet() -> Self {
        Self {
            network: NetworkId::Main,
            epoch_length: 30_000,
            sizes: SizeSchedule::MAINNET,
            pow: RetargetParams {
                target_spacing: 30,
                adjustment_divisor: 2048,
                max_step_bps: 500,
                min_difficulty: Difficulty::from(914_572_800u64),
            },
            pos: RetargetParams {
                target_spacing: 60,
                adjustment_divisor: 1024,
                max_step_bps: 1000,
                min_difficulty: Difficulty::from(10_000u64),
            },
            stake: StakeRules {
                min_confirmations: 1000,
                min_value: 1000 * COIN,
                stake_unit: COIN,
                weight_cap: 1_000_000,
            },
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: NetworkId::Test,
            epoch_length: 3_000,
            sizes: SizeSchedule::MAINNET,
            pow: RetargetParams {
                min_difficulty: Difficulty::from(300_000u64),
                ..Self::mainnet().pow
            },
            pos: RetargetParams {
                min_difficulty: Difficulty::from(1_000u64),
                ..Self::mainnet().pos
            },
            stake: StakeRules {
                min_confirmations: 100,
                min_value: 100 * COIN,
                ..Self::mainnet().stake
            },
        }
    }

    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Main => Self::mainnet(),
            NetworkId::Test => Self::testnet(),
        }
    }

    pub fn epoch_of(&self, number: u64) -> u64 {
        number / self.epoch_length
    }
}
