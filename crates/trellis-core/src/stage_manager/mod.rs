//! # Trellis Stage Manager
//!
//! Sequences the multi-stage startup handshake of a freshly activated batch
//! of plugins. Each worker may define `<Prefix>Stage<N>` commands; stage `N`
//! runs for every plugin of the batch before any plugin starts stage `N+1`.
//!
//! - **[`StageResult`]**: outcome of one stage for one plugin.
//! - **[`barrier::run_staged_barrier`]**: drives the stages through the host.
use std::fmt;

pub mod barrier;

pub use barrier::{BarrierParticipant, BarrierReport, StageOutcome, run_staged_barrier};

/// Result of running one stage for one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// Stage command ran successfully
    Success,
    /// Stage command failed
    Failure(String),
    /// The plugin does not define this stage
    Skipped(String),
}

impl StageResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, StageResult::Failure(_))
    }
}

impl fmt::Display for StageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageResult::Success => write!(f, "Success"),
            StageResult::Failure(msg) => write!(f, "Failure: {}", msg),
            StageResult::Skipped(reason) => write!(f, "Skipped: {}", reason),
        }
    }
}

/// Name of the command running stage `stage` for `prefix`.
pub fn stage_command(prefix: &str, stage: u8) -> String {
    format!("{}Stage{}", prefix, stage)
}
