//! Testing utilities for the Folio workspace
//!
//! Shared stub gateway, fixtures and model response builders.

#![allow(missing_docs)]

mod scripted;

pub use scripted::ScriptedGateway;

use folio_core::{Document, DocumentSet, SectionSpec};
use serde_json::{json, Value};

/// Text of the one-document fixture
pub const SAMPLE_TEXT: &str = "Revenue was $100M.";

/// Same fixture with margin detail, for the positive search path
pub const SAMPLE_TEXT_WITH_MARGIN: &str = "Revenue was $100M. Gross margin improved to 42%.";

pub fn sample_documents() -> DocumentSet {
    DocumentSet::new(vec![Document::new("a.txt", SAMPLE_TEXT)])
}

pub fn sample_documents_with_margin() -> DocumentSet {
    DocumentSet::new(vec![Document::new("a.txt", SAMPLE_TEXT_WITH_MARGIN)])
}

pub fn financial_review_spec() -> SectionSpec {
    SectionSpec::new("Financial Review", "")
        .with_table(true)
        .with_graph(true)
}

/// Model response builders, one per stage schema
pub mod responses {
    use super::{json, Value};

    pub fn draft(content: &str, references: &[(&str, &str)]) -> String {
        let references: Vec<Value> = references
            .iter()
            .map(|(document, location)| json!({"document": document, "location": location}))
            .collect();
        json!({"content": content, "references": references}).to_string()
    }

    pub fn critique(expand_on: &[&str], remove_or_rephrase: &[&str], search_terms: &[&str]) -> String {
        json!({
            "expand_on": expand_on,
            "remove_or_rephrase": remove_or_rephrase,
            "search_terms": search_terms,
        })
        .to_string()
    }

    pub fn empty_critique() -> String {
        critique(&[], &[], &[])
    }

    /// The margin critique used by the rewrite scenarios
    pub fn margin_critique() -> String {
        critique(&["add margin detail"], &[], &["margin"])
    }

    pub fn table(title: &str, rows: Value) -> String {
        json!({"title": title, "rows": rows}).to_string()
    }

    pub fn empty_table() -> String {
        table("", json!([]))
    }

    pub fn bar_chart(title: &str, labels: &[&str], values: &[f64]) -> String {
        json!({
            "title": title,
            "type": "bar",
            "data": {"labels": labels, "datasets": [{"label": title, "data": values}]},
        })
        .to_string()
    }

    pub fn no_graph() -> String {
        json!({"title": "", "type": "none", "data": {}}).to_string()
    }

    /// Wrap a response in a Markdown JSON fence
    pub fn fenced(body: &str) -> String {
        format!("```json\n{body}\n```")
    }
}
