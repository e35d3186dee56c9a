//! Mining ("full") dataset.
//!
//! Generation is split into [`PROGRESS_STEPS`] segments. Each segment is
//! computed in parallel with rayon; between segments the caller's progress
//! callback runs and may cancel the build.

use std::ops::ControlFlow;
use std::time::Instant;

use halcyon_types::H256;
use halcyon_utils::format_duration;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::evaluator::{Dataset, PowResult};
use crate::kernel::{self, Node, HASH_BYTES};
use crate::light::LightDataset;
use crate::WorkError;

/// Number of progress reports over a full build.
pub const PROGRESS_STEPS: u64 = 100;

/// Precomputed mining dataset for one epoch.
pub struct FullDataset {
    epoch: u64,
    seed: H256,
    items: u32,
    nodes: Vec<Node>,
}

impl FullDataset {
    /// Expand `light` into the full dataset.
    ///
    /// `progress` receives the completed percentage after every segment;
    /// returning [`ControlFlow::Break`] aborts with [`WorkError::Cancelled`]
    /// and frees everything built so far.
    pub fn build<F>(
        light: &LightDataset,
        memory_limit: Option<u64>,
        mut progress: F,
    ) -> Result<Self, WorkError>
    where
        F: FnMut(u8) -> ControlFlow<()>,
    {
        let total = light.items();
        let mut nodes = kernel::allocate_nodes(u64::from(total), memory_limit)?;
        let started = Instant::now();
        let step = total.div_ceil(PROGRESS_STEPS as u32).max(1);
        let cache = light.nodes();

        let mut start = 0u32;
        while start < total {
            let end = start.saturating_add(step).min(total);
            nodes.par_extend(
                (start..end)
                    .into_par_iter()
                    .map(|index| kernel::dataset_item(cache, index)),
            );
            start = end;

            let percent = (u64::from(start) * 100 / u64::from(total)) as u8;
            if progress(percent).is_break() {
                debug!(epoch = light.epoch(), percent, "mining dataset build cancelled");
                return Err(WorkError::Cancelled);
            }
        }

        info!(
            epoch = light.epoch(),
            bytes = light.data_size(),
            elapsed = %format_duration(started.elapsed()),
            "built mining dataset"
        );
        Ok(Self {
            epoch: light.epoch(),
            seed: *light.seed_hash(),
            items: total,
            nodes,
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Size of the dataset in bytes.
    pub fn size(&self) -> u64 {
        (self.nodes.len() * HASH_BYTES) as u64
    }
}

impl Dataset for FullDataset {
    fn seed_hash(&self) -> &H256 {
        &self.seed
    }

    fn compute(&self, header_hash: &H256, nonce: u64) -> PowResult {
        kernel::hashimoto(header_hash, nonce, self.items, |index| {
            self.nodes[index as usize]
        })
    }
}

impl std::fmt::Debug for FullDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullDataset")
            .field("epoch", &self.epoch)
            .field("seed", &self.seed)
            .field("size", &self.size())
            .finish()
    }
}
