//! Pipeline errors
//!
//! Stage failures never surface here: the state machine records them as
//! faults and keeps going. Only run-level conditions do.

use crate::state_machine::SectionPhase;
use folio_core::Stage;
use thiserror::Error;

/// Run-level errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run was cancelled while this section was in progress
    #[error("run cancelled during section '{section}'")]
    Cancelled { section: String },

    /// The machine attempted a move outside the phase graph
    #[error("illegal phase transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SectionPhase, to: SectionPhase },
}

impl PipelineError {
    /// Check if the error is a cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Stage the section was in when the error occurred, if known
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Cancelled { .. } => None,
            Self::IllegalTransition { from, .. } => from.stage(),
        }
    }
}

/// Result alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
