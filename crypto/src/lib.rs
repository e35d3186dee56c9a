//! Hash primitives for the Halcyon proof-of-work core.
//!
//! - **Keccak-256** is the fixed primitive `H`: seed chain, header hashes,
//!   stake hybrid hashes and the final proof-of-work value.
//! - **Keccak-512** drives the memory-hard dataset construction and the
//!   per-nonce mix seed.

pub mod hash;

pub use hash::{keccak256, keccak256_multi, keccak512, keccak512_multi, next_seed};
