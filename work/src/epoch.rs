//! Epoch seed chain and per-epoch sizing cache.
//!
//! The seed table is append-only. Readers take a cheap `Arc` snapshot and never
//! wait on hashing; extension is serialized by a dedicated mutex, computes the
//! new entries on a private copy, and publishes it with a pointer swap.
//!
//! Heights come from untrusted headers, so no lookup reaches past
//! [`MAX_EPOCH`]; anything later is refused before any hashing.

use std::collections::HashMap;
use std::sync::Arc;

use halcyon_crypto::next_seed;
use halcyon_types::{SizeSchedule, H256};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::sizes::EpochSizes;
use crate::WorkError;

/// Reverse seed lookups never search past this many epochs.
pub const SEED_SEARCH_HORIZON: u64 = 2048;

/// Last epoch whose seed or sizes will be derived.
pub const MAX_EPOCH: u64 = 1 << 16;

/// Everything needed to build the datasets of one epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochSpec {
    pub epoch: u64,
    pub seed: H256,
    pub sizes: EpochSizes,
}

#[derive(Clone)]
struct SeedTable {
    hashes: Vec<H256>,
    epochs: HashMap<H256, u64>,
}

impl SeedTable {
    fn genesis() -> Self {
        Self {
            hashes: vec![H256::ZERO],
            epochs: HashMap::from([(H256::ZERO, 0)]),
        }
    }

    /// Append seeds until `epoch` is present. The table is never empty.
    fn extend_to(&mut self, epoch: u64) {
        let mut last = self.hashes[self.hashes.len() - 1];
        while (self.hashes.len() as u64) <= epoch {
            last = next_seed(&last);
            self.epochs.insert(last, self.hashes.len() as u64);
            self.hashes.push(last);
        }
    }
}

/// Memoized seed hashes and dataset sizes, keyed by epoch.
pub struct EpochCache {
    epoch_length: u64,
    schedule: SizeSchedule,
    seeds: RwLock<Arc<SeedTable>>,
    extend: Mutex<()>,
    sizes: RwLock<HashMap<u64, EpochSizes>>,
}

impl EpochCache {
    pub fn new(epoch_length: u64, schedule: SizeSchedule) -> Self {
        assert!(epoch_length > 0, "epoch length must be positive");
        Self {
            epoch_length,
            schedule,
            seeds: RwLock::new(Arc::new(SeedTable::genesis())),
            extend: Mutex::new(()),
            sizes: RwLock::new(HashMap::new()),
        }
    }

    pub fn epoch_of(&self, number: u64) -> u64 {
        number / self.epoch_length
    }

    fn snapshot(&self) -> Arc<SeedTable> {
        Arc::clone(&self.seeds.read())
    }

    /// Seed hash of the epoch containing block `number`.
    pub fn seed_hash(&self, number: u64) -> Result<H256, WorkError> {
        self.seed_for_epoch(self.epoch_of(number))
    }

    pub fn seed_for_epoch(&self, epoch: u64) -> Result<H256, WorkError> {
        check_epoch(epoch)?;
        if let Some(seed) = self.snapshot().hashes.get(epoch as usize) {
            return Ok(*seed);
        }

        let _extending = self.extend.lock();
        let current = self.snapshot();
        if let Some(seed) = current.hashes.get(epoch as usize) {
            return Ok(*seed);
        }

        let from = current.hashes.len();
        let mut next = SeedTable::clone(&current);
        next.extend_to(epoch);
        let seed = next.hashes[epoch as usize];
        *self.seeds.write() = Arc::new(next);
        debug!(from, to = epoch, "extended seed table");
        Ok(seed)
    }

    /// Reverse lookup: the first block height of the epoch whose seed is `seed`.
    ///
    /// Extends the table up to [`SEED_SEARCH_HORIZON`] epochs while searching;
    /// an unknown seed beyond that is an [`WorkError::EpochLookup`].
    pub fn number(&self, seed: &H256) -> Result<u64, WorkError> {
        if let Some(epoch) = self.snapshot().epochs.get(seed) {
            return Ok(epoch * self.epoch_length);
        }

        let _extending = self.extend.lock();
        let current = self.snapshot();
        if let Some(epoch) = current.epochs.get(seed) {
            return Ok(epoch * self.epoch_length);
        }

        let not_found = WorkError::EpochLookup {
            seed: *seed,
            horizon: SEED_SEARCH_HORIZON,
        };
        if current.hashes.len() as u64 >= SEED_SEARCH_HORIZON {
            return Err(not_found);
        }

        let mut next = SeedTable::clone(&current);
        next.extend_to(SEED_SEARCH_HORIZON - 1);
        let found = next.epochs.get(seed).copied();
        *self.seeds.write() = Arc::new(next);
        trace!(%seed, ?found, "searched seed table to horizon");
        found.map(|epoch| epoch * self.epoch_length).ok_or(not_found)
    }

    /// Number of epochs whose seed is currently cached.
    pub fn cached_epochs(&self) -> usize {
        self.snapshot().hashes.len()
    }

    pub fn sizes_for_epoch(&self, epoch: u64) -> Result<EpochSizes, WorkError> {
        check_epoch(epoch)?;
        if let Some(sizes) = self.sizes.read().get(&epoch) {
            return Ok(*sizes);
        }
        let sizes = EpochSizes::for_epoch(&self.schedule, epoch);
        self.sizes.write().insert(epoch, sizes);
        Ok(sizes)
    }

    /// Verification dataset size in bytes for block `number`.
    pub fn cache_size(&self, number: u64) -> Result<u64, WorkError> {
        Ok(self.sizes_for_epoch(self.epoch_of(number))?.cache)
    }

    /// Mining dataset size in bytes for block `number`.
    pub fn data_size(&self, number: u64) -> Result<u64, WorkError> {
        Ok(self.sizes_for_epoch(self.epoch_of(number))?.data)
    }

    /// Seed and sizes for the epoch containing block `number`.
    pub fn spec(&self, number: u64) -> Result<EpochSpec, WorkError> {
        let epoch = self.epoch_of(number);
        Ok(EpochSpec {
            epoch,
            seed: self.seed_for_epoch(epoch)?,
            sizes: self.sizes_for_epoch(epoch)?,
        })
    }
}

fn check_epoch(epoch: u64) -> Result<(), WorkError> {
    if epoch > MAX_EPOCH {
        return Err(WorkError::EpochOutOfRange {
            epoch,
            max: MAX_EPOCH,
        });
    }
    Ok(())
}
