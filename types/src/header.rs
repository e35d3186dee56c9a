//! Block header and stake output records consumed by the proof-of-work core.
//!
//! Both are produced by the storage and networking layers; the core only reads them.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, H256};

/// Reference to a transaction output: the transaction hash and output index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputPoint {
    pub hash: H256,
    pub index: u32,
}

/// An unspent output offered as stake weight by a proof-of-stake block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeOutput {
    pub point: OutputPoint,
    /// Output value in base units.
    pub value: u64,
    /// Height of the block that confirmed the output.
    pub height: u64,
}

impl StakeOutput {
    /// Number of blocks between the output's confirmation and `number`.
    pub fn confirmations_at(&self, number: u64) -> u64 {
        number.saturating_sub(self.height)
    }
}

/// A block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub previous_block_hash: H256,
    pub merkle: H256,
    /// Unix seconds.
    pub timestamp: u32,
    /// Encoded difficulty the block claims to satisfy.
    pub bits: Difficulty,
    pub nonce: u64,
    pub mix_hash: H256,
    /// Block height.
    pub number: u64,
    /// Output staked by a proof-of-stake block; `None` for proof-of-work blocks.
    #[serde(default)]
    pub stake: Option<OutputPoint>,
}

impl Header {
    pub fn is_proof_of_stake(&self) -> bool {
        self.stake.is_some()
    }
}
