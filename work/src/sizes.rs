//! Dataset sizing per epoch.
//!
//! Each size grows linearly with the epoch and is then rounded down until the
//! number of items it holds is prime, which keeps the dataset's access pattern
//! from aliasing on power-of-two strides.

use halcyon_types::SizeSchedule;

use crate::kernel::{HASH_BYTES, MIX_BYTES};

/// Byte sizes of the verification and mining datasets for one epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochSizes {
    pub cache: u64,
    pub data: u64,
}

impl EpochSizes {
    pub fn for_epoch(schedule: &SizeSchedule, epoch: u64) -> Self {
        Self {
            cache: cache_size(schedule, epoch),
            data: data_size(schedule, epoch),
        }
    }
}

/// Verification dataset size in bytes: a prime number of 64-byte items.
pub fn cache_size(schedule: &SizeSchedule, epoch: u64) -> u64 {
    let raw = schedule
        .cache_init
        .saturating_add(schedule.cache_growth.saturating_mul(epoch));
    round_to_prime_items(raw, HASH_BYTES as u64)
}

/// Mining dataset size in bytes: a prime number of 128-byte pages.
pub fn data_size(schedule: &SizeSchedule, epoch: u64) -> u64 {
    let raw = schedule
        .dataset_init
        .saturating_add(schedule.dataset_growth.saturating_mul(epoch));
    round_to_prime_items(raw, MIX_BYTES as u64)
}

fn round_to_prime_items(raw: u64, unit: u64) -> u64 {
    let mut size = raw.saturating_sub(unit);
    while size >= 2 * unit && !is_prime(size / unit) {
        size -= 2 * unit;
    }
    size
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3u64;
    while divisor.saturating_mul(divisor) <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}
