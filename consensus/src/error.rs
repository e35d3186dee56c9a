use halcyon_work::WorkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Work(#[from] WorkError),

    #[error("invalid engine configuration: {0}")]
    Config(String),
}
