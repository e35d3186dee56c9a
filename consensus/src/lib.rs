//! Consensus rules for the Halcyon hybrid proof-of-work / proof-of-stake chain.
//!
//! A single [`ConsensusEngine`] is built at startup from an [`EngineConfig`].
//! Its chain parameters are fixed for the life of the process.
//!
//! ## Module overview
//!
//! - [`engine`]: the facade every header check goes through.
//! - [`difficulty`]: per-block retargeting for both block kinds.
//! - [`hashing`]: header digests and difficulty boundaries.
//! - [`stake`]: the proof-of-stake acceptance path.
//! - [`verdict`]: accept / reject outcomes.
//! - [`config`]: TOML-backed engine configuration.

pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod stake;
pub mod verdict;

pub use config::EngineConfig;
pub use difficulty::{retarget, DifficultyCalculator};
pub use engine::ConsensusEngine;
pub use error::ConsensusError;
pub use hashing::{boundary, hash_head, hash_head_pos};
pub use stake::verify_stake;
pub use verdict::{RejectReason, Verdict};
