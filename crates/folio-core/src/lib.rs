//! Folio Core - shared vocabulary of the section pipeline
//!
//! Defines everything the pipeline stages exchange:
//! - Documents and the shared, read-only document set
//! - Section requests, the mutable per-section working state and the
//!   immutable finalized snapshot
//! - The stage error taxonomy (invalid input vs. recoverable stage faults)
//! - Defensive parsing of model responses into stage schemas
//! - Run-level configuration
//!
//! # Example
//!
//! ```rust
//! use folio_core::{Document, DocumentSet, SectionSpec, SectionState};
//!
//! let documents = DocumentSet::new(vec![Document::new("a.txt", "Revenue was $100M.")]);
//! let spec = SectionSpec::new("Financial Review", "");
//! let state = SectionState::new(documents, &spec);
//!
//! assert_eq!(state.loop_count, 0);
//! assert!(state.content().is_empty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use config::{default_sections, GatewayConfig, ReportConfig};
pub use error::{ConfigError, GatewayError, ResponseError, StageCause, StageError};
pub use response::{parse_response, strip_code_fence};
pub use types::{
    Critique, Document, DocumentSet, Draft, FinalizedSection, GraphKind, GraphSpec, Reference,
    SectionSpec, SectionState, Stage, StageFault, StageUpdate, TabularData,
};

/// Placeholder content used when extraction yields no `content` key
pub const NO_INFORMATION_PLACEHOLDER: &str = "No information found for this section.";

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Folio Core
    pub use crate::{
        Critique, Document, DocumentSet, Draft, FinalizedSection, GraphKind, GraphSpec, Reference,
        ReportConfig, SectionSpec, SectionState, Stage, StageError, TabularData,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
