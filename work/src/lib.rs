//! Memory-hard proof-of-work.
//!
//! Epoch seeds and sizes are derived and memoized by [`EpochCache`]; per-epoch
//! datasets are built once and shared through a [`DatasetRegistry`]; a
//! [`PowEvaluator`] checks proposed solutions and a [`Miner`] searches for them.
//!
//! ## Module overview
//!
//! - [`epoch`]: seed chain, reverse seed lookup, per-epoch sizes.
//! - [`sizes`]: the dataset growth schedule with prime rounding.
//! - [`light`]: the verification dataset.
//! - [`full`]: the mining dataset, built from a verification dataset.
//! - [`registry`]: deduplicated, reference-counted dataset handles.
//! - [`evaluator`]: work packages, solutions and acceptance.
//! - [`generator`]: parallel nonce search.

pub mod epoch;
pub mod error;
pub mod evaluator;
pub mod full;
pub mod generator;
mod kernel;
pub mod light;
pub mod registry;
pub mod sizes;

pub use epoch::{EpochCache, EpochSpec, MAX_EPOCH, SEED_SEARCH_HORIZON};
pub use error::WorkError;
pub use evaluator::{Dataset, PowEvaluator, PowOutcome, PowResult, Solution, WorkPackage};
pub use full::FullDataset;
pub use generator::Miner;
pub use light::LightDataset;
pub use registry::DatasetRegistry;
pub use sizes::EpochSizes;
