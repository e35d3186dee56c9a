//! Nonce search (multi-threaded CPU).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::debug;

use crate::evaluator::{Dataset, PowEvaluator, Solution, WorkPackage};
use crate::WorkError;

/// Searches the nonce space of a work package using all available CPU cores.
pub struct Miner;

impl Miner {
    /// Try up to `max_attempts` nonces starting at `start_nonce`.
    ///
    /// The attempt range is strided across the rayon pool; every thread checks
    /// the stop flags before each nonce, and the first to find a nonce below
    /// the boundary signals the others to stop. Returns `Ok(None)` once the
    /// budget is spent and [`WorkError::Cancelled`] when `cancel` is raised
    /// first.
    pub fn search<D>(
        &self,
        dataset: &D,
        package: &WorkPackage,
        start_nonce: u64,
        max_attempts: u64,
        cancel: &AtomicBool,
    ) -> Result<Option<Solution>, WorkError>
    where
        D: Dataset + ?Sized,
    {
        let found: Mutex<Option<Solution>> = Mutex::new(None);
        let done = AtomicBool::new(false);
        let attempts = AtomicU64::new(0);
        let num_threads = rayon::current_num_threads().max(1) as u64;

        (0..num_threads).into_par_iter().for_each(|thread_id| {
            let mut offset = thread_id;
            let mut tried = 0;
            while offset < max_attempts {
                if done.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed) {
                    break;
                }
                let nonce = start_nonce.wrapping_add(offset);
                let result = dataset.compute(&package.header_hash, nonce);
                tried += 1;
                if PowEvaluator::meets_boundary(&result.value, &package.boundary) {
                    done.store(true, Ordering::Relaxed);
                    found.lock().get_or_insert(Solution {
                        nonce,
                        mix_hash: result.mix_hash,
                    });
                    break;
                }
                offset = offset.saturating_add(num_threads);
            }
            attempts.fetch_add(tried, Ordering::Relaxed);
        });

        let solution = found.into_inner();
        debug!(
            attempts = attempts.load(Ordering::Relaxed),
            found = solution.is_some(),
            "nonce search finished"
        );
        match solution {
            Some(solution) => Ok(Some(solution)),
            None if cancel.load(Ordering::Relaxed) => Err(WorkError::Cancelled),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PowOutcome;
    use crate::light::LightDataset;
    use crate::testing::tiny_spec;
    use halcyon_types::{H256, U256};

    fn package(light: &LightDataset, boundary: U256) -> WorkPackage {
        WorkPackage {
            boundary: H256::from_u256(boundary),
            header_hash: H256::new([0x42; 32]),
            seed_hash: *light.seed_hash(),
        }
    }

    #[test]
    fn found_solution_passes_evaluation() {
        let light = LightDataset::build(&tiny_spec(0), None).unwrap();
        // Roughly one nonce in sixteen qualifies.
        let package = package(&light, U256::MAX >> 4);
        let solution = Miner
            .search(&light, &package, 0, 10_000, &AtomicBool::new(false))
            .unwrap()
            .expect("a solution within 10k attempts");

        let outcome = PowEvaluator::evaluate(&light, &package, &solution);
        assert!(matches!(outcome, PowOutcome::Valid(_)));
    }

    #[test]
    fn zero_boundary_exhausts_budget() {
        let light = LightDataset::build(&tiny_spec(0), None).unwrap();
        let package = package(&light, U256::zero());
        let result = Miner.search(&light, &package, 0, 64, &AtomicBool::new(false));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn raised_cancel_flag_stops_search() {
        let light = LightDataset::build(&tiny_spec(0), None).unwrap();
        let package = package(&light, U256::zero());
        let result = Miner.search(&light, &package, 0, u64::MAX, &AtomicBool::new(true));
        assert!(matches!(result, Err(WorkError::Cancelled)));
    }

    #[test]
    fn start_nonce_wraps() {
        let light = LightDataset::build(&tiny_spec(0), None).unwrap();
        let package = package(&light, U256::MAX);
        let solution = Miner
            .search(&light, &package, u64::MAX, 4, &AtomicBool::new(false))
            .unwrap()
            .unwrap();
        assert!(solution.nonce == u64::MAX || solution.nonce < 3);
    }
}
