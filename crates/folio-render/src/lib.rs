//! Folio Render - report output
//!
//! Consumers of the orchestrator's section stream:
//! - [`JsonReportWriter`] persists sections one by one as a JSON array
//! - [`HtmlReport`] renders a finished report into a single HTML page

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod html;
pub mod json;

pub use error::{RenderError, Result};
pub use html::{render_html_file, HtmlReport, DEFAULT_TITLE};
pub use json::{read_report, JsonReportWriter};
