//! Prompt fragments shared by the roles

use folio_core::{Document, FinalizedSection, Reference};
use std::fmt::Write;

/// Documents as delimited blocks, one per file
pub(crate) fn format_documents(documents: &[Document]) -> String {
    let mut out = String::new();
    for (idx, doc) in documents.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = write!(out, "--- Document: {} ---\n{}", doc.filename, doc.content);
    }
    out
}

/// Title line plus the optional free-text instruction
pub(crate) fn section_line(title: &str, instruction: &str) -> String {
    if instruction.trim().is_empty() {
        format!("Section Title: {title}")
    } else {
        format!("Section Title: {title}\n{instruction}")
    }
}

/// References as a JSON array
pub(crate) fn format_references(references: &[Reference]) -> String {
    serde_json::to_string_pretty(references).unwrap_or_else(|_| "[]".to_string())
}

/// Earlier sections as read-only context, `None` when there are none
pub(crate) fn format_prior_sections(prior: &[FinalizedSection]) -> Option<String> {
    if prior.is_empty() {
        return None;
    }
    let mut out = String::from("Previously completed sections (for consistency, do not repeat):\n");
    for section in prior {
        let _ = write!(out, "\n### {}\n{}\n", section.section, section.content);
    }
    Some(out)
}

/// Instruction appended to every system directive
pub(crate) const JSON_ONLY: &str =
    "Respond with a single JSON object and nothing else. Do not wrap it in Markdown.";
