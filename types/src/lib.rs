//! Fundamental types for the Halcyon proof-of-work core.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! digests, headers, stake outputs, network selection and the per-network
//! consensus constants.

pub mod error;
pub mod hash;
pub mod header;
pub mod network;
pub mod params;

pub use error::TypesError;
pub use hash::H256;
pub use header::{Header, OutputPoint, StakeOutput};
pub use network::NetworkId;
pub use params::{ChainParams, RetargetParams, SizeSchedule, StakeRules, COIN};

/// Encoded block difficulty. Higher is harder.
pub type Difficulty = primitive_types::U256;

pub use primitive_types::{U256, U512};
