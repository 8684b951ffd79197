//! Config loading and the plain listings behind `ingest` and `sections`

use anyhow::{Context, Result};
use folio_core::{Document, ReportConfig, SectionSpec};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

/// Config from `path` (or defaults) with the command-line budget applied
///
/// # Errors
/// Fails when the file cannot be loaded or the result does not validate.
pub fn load_config(path: Option<&Path>, max_review_loops: Option<u32>) -> Result<ReportConfig> {
    let mut config = match path {
        Some(path) => ReportConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(loops) = max_review_loops {
        config = config.with_max_review_loops(loops);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// One line per document: name, type and size
#[must_use]
pub fn document_listing(documents: &[Document]) -> String {
    let mut out = String::new();
    for doc in documents {
        let _ = writeln!(
            out,
            "- {} (type: {}, {} bytes)",
            doc.filename,
            doc.kind().unwrap_or("unknown"),
            doc.metadata.get("bytes").map_or("?", String::as_str),
        );
    }
    out
}

/// Documents as a pretty JSON array, without their content
///
/// # Errors
/// Propagates serialization failures.
pub fn documents_json(documents: &[Document]) -> Result<String> {
    let entries: Vec<_> = documents
        .iter()
        .map(|doc| {
            json!({
                "filename": doc.filename,
                "metadata": doc.metadata,
            })
        })
        .collect();
    serde_json::to_string_pretty(&entries).context("serializing document list")
}

#[derive(Serialize)]
struct SectionList<'a> {
    sections: &'a [SectionSpec],
}

/// Sections as a TOML fragment that a config file can include verbatim
///
/// # Errors
/// Propagates serialization failures.
pub fn sections_toml(sections: &[SectionSpec]) -> Result<String> {
    toml::to_string(&SectionList { sections }).context("serializing sections")
}
