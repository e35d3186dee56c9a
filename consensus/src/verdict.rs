//! Outcomes of header checks.
//!
//! A header that fails a consensus rule is an expected event, so it is
//! reported as a [`Verdict`] rather than an error.

use std::fmt;

use halcyon_types::Difficulty;
use halcyon_work::PowOutcome;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The seal was evaluated against a dataset for another seed.
    WrongDataset,
    /// Recomputed mix hash differs from the one in the header.
    MixMismatch,
    /// Proof-of-work value is not below the boundary.
    AboveBoundary,
    /// Header bits differ from the retarget of its parent.
    DifficultyMismatch {
        expected: Difficulty,
        actual: Difficulty,
    },
    /// Header does not reference a stake output.
    MissingStake,
    /// Supplied output is not the one the header references.
    StakeMismatch,
    StakeImmature { confirmations: u64, required: u64 },
    StakeTooSmall { value: u64, required: u64 },
    /// Stake hash is not below the weighted boundary.
    StakeAboveTarget,
    /// Header height lies past the last epoch with a derivable seed.
    EpochOutOfRange { epoch: u64, max: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongDataset => write!(f, "evaluated against the wrong dataset"),
            Self::MixMismatch => write!(f, "mix hash mismatch"),
            Self::AboveBoundary => write!(f, "proof-of-work value above boundary"),
            Self::DifficultyMismatch { expected, actual } => {
                write!(f, "difficulty {actual} does not match expected {expected}")
            }
            Self::MissingStake => write!(f, "header references no stake output"),
            Self::StakeMismatch => write!(f, "stake output does not match header reference"),
            Self::StakeImmature {
                confirmations,
                required,
            } => write!(f, "stake output has {confirmations} confirmations, {required} required"),
            Self::StakeTooSmall { value, required } => {
                write!(f, "stake value {value} below minimum {required}")
            }
            Self::StakeAboveTarget => write!(f, "stake hash above weighted boundary"),
            Self::EpochOutOfRange { epoch, max } => {
                write!(f, "epoch {epoch} is beyond the last supported epoch {max}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl From<PowOutcome> for Verdict {
    fn from(outcome: PowOutcome) -> Self {
        match outcome {
            PowOutcome::Valid(_) => Self::Accepted,
            PowOutcome::WrongDataset => Self::Rejected(RejectReason::WrongDataset),
            PowOutcome::MixMismatch(_) => Self::Rejected(RejectReason::MixMismatch),
            PowOutcome::AboveBoundary(_) => Self::Rejected(RejectReason::AboveBoundary),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}
