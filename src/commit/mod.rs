//! Committing converted blocks to a content host
//!
//! [`committer`] writes a block list in batches the host accepts;
//! [`orchestrator`] moves over-deep content under its owners once they exist
//! and cleans up leftover marker tokens.

pub mod committer;
pub mod errors;
pub mod orchestrator;
pub mod retry;

pub use committer::{CommitReport, Committer, Container};
pub use errors::{CommitError, CommitResult, CommitWarning};
pub use orchestrator::{
    Anchor, OrchestrationReport, Orchestrator, OwnerLocation, RelocationQueue, ResolutionReport,
    SweepReport, collect_relocations, commit_with_relocations,
};
pub use retry::retry_call;
