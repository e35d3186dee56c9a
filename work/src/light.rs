//! Verification ("light") dataset.

use std::time::Instant;

use halcyon_types::H256;
use halcyon_utils::format_duration;
use tracing::{info, warn};

use crate::epoch::EpochSpec;
use crate::evaluator::{Dataset, PowResult};
use crate::kernel::{self, Node, MIX_BYTES};
use crate::WorkError;

/// The per-epoch cache. Small enough to build on demand; each evaluation
/// derives the mining dataset items it touches from it.
pub struct LightDataset {
    epoch: u64,
    seed: H256,
    data_size: u64,
    items: u32,
    cache: Vec<Node>,
}

impl LightDataset {
    pub fn build(spec: &EpochSpec, memory_limit: Option<u64>) -> Result<Self, WorkError> {
        if spec.sizes.data < MIX_BYTES as u64 {
            return Err(WorkError::InvalidSize {
                bytes: spec.sizes.data,
            });
        }
        let items = kernel::item_count(spec.sizes.data)?;

        let started = Instant::now();
        let cache = kernel::make_cache(spec.sizes.cache, &spec.seed, memory_limit).inspect_err(
            |e| warn!(epoch = spec.epoch, error = %e, "verification dataset build failed"),
        )?;
        info!(
            epoch = spec.epoch,
            bytes = spec.sizes.cache,
            elapsed = %format_duration(started.elapsed()),
            "built verification dataset"
        );

        Ok(Self {
            epoch: spec.epoch,
            seed: spec.seed,
            data_size: spec.sizes.data,
            items,
            cache,
        })
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Size of the verification cache in bytes.
    pub fn size(&self) -> u64 {
        (self.cache.len() * kernel::HASH_BYTES) as u64
    }

    /// Size of the mining dataset this cache expands into.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Number of items in the mining dataset.
    pub(crate) fn items(&self) -> u32 {
        self.items
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.cache
    }
}

impl Dataset for LightDataset {
    fn seed_hash(&self) -> &H256 {
        &self.seed
    }

    fn compute(&self, header_hash: &H256, nonce: u64) -> PowResult {
        kernel::hashimoto(header_hash, nonce, self.items, |index| {
            kernel::dataset_item(&self.cache, index)
        })
    }
}

impl std::fmt::Debug for LightDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightDataset")
            .field("epoch", &self.epoch)
            .field("seed", &self.seed)
            .field("size", &self.size())
            .finish()
    }
}
