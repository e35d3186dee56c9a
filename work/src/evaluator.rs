//! Proof-of-work evaluation against a work package.
//!
//! An invalid solution is an expected outcome, reported as a [`PowOutcome`],
//! never as an error.

use halcyon_types::H256;

/// Output of the kernel for one `(header hash, nonce, dataset)` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowResult {
    /// Compared against the boundary; lower is better.
    pub value: H256,
    /// Compressed mix, committed to in the header so verifiers can reject
    /// mismatched solutions before trusting `value`.
    pub mix_hash: H256,
}

/// One candidate job: what a solution must hash against and beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkPackage {
    pub boundary: H256,
    pub header_hash: H256,
    pub seed_hash: H256,
}

/// A proposed nonce and the mix value it claims to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub mix_hash: H256,
}

/// A per-epoch dataset able to evaluate nonces.
///
/// The verification and mining datasets for the same seed must return
/// identical results for every input.
pub trait Dataset: Send + Sync {
    fn seed_hash(&self) -> &H256;

    fn compute(&self, header_hash: &H256, nonce: u64) -> PowResult;
}

/// Why a solution was or was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowOutcome {
    Valid(PowResult),
    /// The dataset belongs to a different epoch than the work package.
    WrongDataset,
    MixMismatch(PowResult),
    AboveBoundary(PowResult),
}

impl PowOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Stateless checker for proposed solutions.
pub struct PowEvaluator;

impl PowEvaluator {
    /// Recompute the solution's result and accept it only if the mix value
    /// matches and the value is strictly below the boundary.
    pub fn evaluate<D>(dataset: &D, package: &WorkPackage, solution: &Solution) -> PowOutcome
    where
        D: Dataset + ?Sized,
    {
        if dataset.seed_hash() != &package.seed_hash {
            return PowOutcome::WrongDataset;
        }
        let result = dataset.compute(&package.header_hash, solution.nonce);
        if result.mix_hash != solution.mix_hash {
            PowOutcome::MixMismatch(result)
        } else if !Self::meets_boundary(&result.value, &package.boundary) {
            PowOutcome::AboveBoundary(result)
        } else {
            PowOutcome::Valid(result)
        }
    }

    /// `value < boundary`, both read as big-endian integers.
    pub fn meets_boundary(value: &H256, boundary: &H256) -> bool {
        value < boundary
    }
}
