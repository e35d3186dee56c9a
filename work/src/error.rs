use halcyon_types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("cannot allocate {bytes} bytes for dataset")]
    Allocation { bytes: u64 },

    #[error("dataset size {bytes} bytes is too small to evaluate")]
    InvalidSize { bytes: u64 },

    #[error("seed hash {seed} not found within {horizon} epochs")]
    EpochLookup { seed: H256, horizon: u64 },

    #[error("epoch {epoch} is beyond the last supported epoch {max}")]
    EpochOutOfRange { epoch: u64, max: u64 },

    #[error("work generation cancelled")]
    Cancelled,
}
