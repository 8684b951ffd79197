//! Folio CLI - the `folio` binary's building blocks
//!
//! The binary wires configuration, ingestion, the section pipeline and the
//! renderers together. Everything it needs beyond argument dispatch lives
//! here so it can be tested without a terminal or a model endpoint.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod listing;
pub mod logging;
pub mod report;

pub use cli::{command, verbose, IngestOptions, RunOptions};
pub use report::{report_paths, write_report, ReportPaths, ReportSummary};
