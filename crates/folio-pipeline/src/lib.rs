//! Folio Pipeline - section state machine and report orchestrator
//!
//! ```text
//! documents + sections
//!        |
//!   ReportOrchestrator --(one fresh SectionState per section)--> SectionMachine
//!        |                                                          |
//!        <------------------- FinalizedSection ---------------------
//! ```
//!
//! Sections run strictly one after another, stages strictly one after
//! another within a section. Stage failures degrade a section, they never
//! stop the run. Only cancellation does.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod state_machine;

pub use cancel::CancellationToken;
pub use error::{PipelineError, Result};
pub use orchestrator::{ReportOrchestrator, ReportRun};
pub use state_machine::{
    allowed_transitions, next_phase, validate_transition, SectionMachine, SectionPhase,
};

// Convenience for callers wiring a machine by hand
pub use folio_agents::SectionAgents;
