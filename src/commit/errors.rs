//! Commit errors and non-fatal warnings

use std::fmt;
use thiserror::Error;

use crate::blocks::RelocationId;
use crate::host::HostError;

/// Result type alias for commit operations
pub type CommitResult<T> = Result<T, CommitError>;

#[derive(Debug, Error)]
pub enum CommitError {
    /// A create/append batch failed after retries; earlier batches stay
    /// committed
    #[error("Batch {batch_index} failed with {committed} blocks already committed: {source}")]
    BatchFailed {
        batch_index: usize,
        committed: usize,
        #[source]
        source: HostError,
    },

    /// Relocated content could be placed neither under its owner nor at the
    /// document root
    #[error("Relocation {relocation} could not be committed: {source}")]
    RelocationFailed {
        relocation: RelocationId,
        #[source]
        source: HostError,
    },
}

impl CommitError {
    /// Blocks committed before the failure
    #[must_use]
    pub fn committed(&self) -> usize {
        match self {
            CommitError::BatchFailed { committed, .. } => *committed,
            CommitError::RelocationFailed { .. } => 0,
        }
    }
}

/// Something went wrong but the document was still committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitWarning {
    /// Relocated blocks were appended at the document root because their
    /// owner could not be found or written to
    OrphanedRelocation {
        relocation: RelocationId,
        blocks: usize,
        reason: String,
    },
    /// The marker sweep could not read or rewrite a block
    SweepFailed { block_id: String, reason: String },
}

impl fmt::Display for CommitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitWarning::OrphanedRelocation {
                relocation,
                blocks,
                reason,
            } => write!(f, "{blocks} blocks of {relocation} appended at document root: {reason}"),
            CommitWarning::SweepFailed { block_id, reason } => {
                write!(f, "marker sweep failed at {block_id}: {reason}")
            }
        }
    }
}
