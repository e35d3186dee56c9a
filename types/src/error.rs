use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid hex digest: {0}")]
    InvalidHex(String),

    #[error("digest must be 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
