//! Shared, deduplicated dataset handles keyed by seed hash.
//!
//! Every seed gets a build slot. The first caller to lock a slot builds the
//! dataset; callers arriving while the build is in flight block on the same
//! slot and receive the finished handle instead of starting their own build.
//! A failed build stores nothing, so the next caller retries from scratch.
//!
//! The registry itself holds only weak references, plus strong references to
//! the `retain` most recently built datasets. Anything older is released as
//! soon as its last holder drops it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use halcyon_types::H256;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::WorkError;

type Slot<T> = Arc<Mutex<Weak<T>>>;

pub struct DatasetRegistry<T> {
    slots: Mutex<HashMap<H256, Slot<T>>>,
    retained: Mutex<VecDeque<(H256, Arc<T>)>>,
    retain: usize,
}

impl<T> DatasetRegistry<T> {
    /// Create a registry that keeps the `retain` most recent datasets alive
    /// even while nobody holds them.
    pub fn new(retain: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            retained: Mutex::new(VecDeque::with_capacity(retain + 1)),
            retain,
        }
    }

    /// Return the live dataset for `seed`, building it with `build` if no
    /// holder has one.
    pub fn acquire<F>(&self, seed: &H256, build: F) -> Result<Arc<T>, WorkError>
    where
        F: FnOnce() -> Result<T, WorkError>,
    {
        let slot = self.slot(seed);
        let mut current = slot.lock();
        if let Some(dataset) = current.upgrade() {
            trace!(%seed, "reusing dataset");
            return Ok(dataset);
        }

        let dataset = Arc::new(build()?);
        *current = Arc::downgrade(&dataset);
        drop(current);
        self.retain_recent(*seed, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// The live dataset for `seed`, without building.
    pub fn get(&self, seed: &H256) -> Option<Arc<T>> {
        let slot = self.slots.lock().get(seed).cloned()?;
        let current = slot.lock();
        current.upgrade()
    }

    /// Number of seeds with a live dataset.
    pub fn live(&self) -> usize {
        let slots: Vec<Slot<T>> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().strong_count() > 0).count()
    }

    fn slot(&self, seed: &H256) -> Slot<T> {
        let mut slots = self.slots.lock();
        // A slot referenced only by the map has no build in flight, so its lock is free.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || slot.lock().strong_count() > 0);
        Arc::clone(slots.entry(*seed).or_default())
    }

    fn retain_recent(&self, seed: H256, dataset: Arc<T>) {
        if self.retain == 0 {
            return;
        }
        let mut retained = self.retained.lock();
        retained.retain(|(held, _)| *held != seed);
        retained.push_back((seed, dataset));
        while retained.len() > self.retain {
            if let Some((evicted, _)) = retained.pop_front() {
                debug!(seed = %evicted, "released retained dataset");
            }
        }
    }
}
