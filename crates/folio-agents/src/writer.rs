//! Writer role
//!
//! Revises a draft from a critique. Before calling the model it runs a
//! deterministic local search for the critique's search terms and hands the
//! matching snippets over as new evidence. The model returns the complete
//! updated reference list; it replaces the old one.

use crate::gateway::{ModelGateway, ModelRequest};
use crate::prompt::{format_references, section_line, JSON_ONLY};
use folio_core::{parse_response, Critique, Document, Draft, Reference, Stage, StageError};
use regex::RegexBuilder;
use serde::Deserialize;
use std::sync::Arc;

/// Search result when no term matched any document
pub const NO_NEW_INFORMATION: &str = "No new information found for search terms.";

/// Rewrite response schema
#[derive(Debug, Deserialize)]
struct RewriteResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    references: Vec<Reference>,
}

/// Result of a rewrite request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The draft was revised
    Rewritten(Draft),
    /// Nothing actionable in the critique; no model call was made
    Skipped,
}

/// Revises drafts from critiques
#[derive(Clone)]
pub struct Writer {
    gateway: Arc<dyn ModelGateway>,
    snippet_chars: usize,
}

impl Writer {
    /// Create new writer
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>, snippet_chars: usize) -> Self {
        Self {
            gateway,
            snippet_chars,
        }
    }

    /// Revise a draft
    ///
    /// # Errors
    /// - `StageError::InvalidInput` when the draft is empty
    /// - `StageError::Rewrite` for model or parse failures
    pub async fn rewrite(
        &self,
        title: &str,
        instruction: &str,
        draft: &Draft,
        critique: Option<&Critique>,
        documents: &[Document],
    ) -> Result<RewriteOutcome, StageError> {
        let Some(critique) = critique.filter(|c| c.is_actionable()) else {
            tracing::debug!(section = %title, "no actionable critique, skipping rewrite");
            return Ok(RewriteOutcome::Skipped);
        };
        if draft.content.trim().is_empty() {
            return Err(StageError::InvalidInput(format!(
                "section '{title}' has no content to rewrite"
            )));
        }

        let new_information = targeted_search(documents, &critique.search_terms, self.snippet_chars);
        if new_information != NO_NEW_INFORMATION {
            tracing::info!(section = %title, "new information found for search terms");
        }

        let request = build_request(title, instruction, draft, critique, &new_information);
        tracing::info!(section = %title, "rewriting section");

        let raw = self
            .gateway
            .complete(&request)
            .await
            .map_err(|e| StageError::for_stage(Stage::Rewrite, title, e))?;
        let response: RewriteResponse =
            parse_response(&raw).map_err(|e| StageError::for_stage(Stage::Rewrite, title, e))?;

        // Content and references move together: a rewrite without content
        // keeps the previous draft whole.
        match response.content.filter(|c| !c.trim().is_empty()) {
            Some(content) => Ok(RewriteOutcome::Rewritten(Draft::new(content, response.references))),
            None => {
                tracing::warn!(section = %title, "rewrite returned no content, keeping previous draft");
                Ok(RewriteOutcome::Rewritten(draft.clone()))
            }
        }
    }
}

fn build_request(
    title: &str,
    instruction: &str,
    draft: &Draft,
    critique: &Critique,
    new_information: &str,
) -> ModelRequest {
    let critique_json = serde_json::to_string_pretty(critique).unwrap_or_default();
    let system = format!(
        "You are an expert financial report writer. Rewrite the section below using the \
         critique and any new information found by targeted searches.\n\n\
         **Critique:**\n{critique_json}\n\n\
         **Original Section Content:**\n{}\n\n\
         **Original References:**\n{}\n\n\
         **New Information from Targeted Search (if any):**\n{new_information}\n\n\
         Integrate the new information, address every critique point (expand on, remove or \
         rephrase) and produce a clearly improved section. Update the references to cover \
         everything the new content cites.\n\n\
         Output keys:\n\
         - \"content\": the rewritten section\n\
         - \"references\": the complete updated list of {{\"document\": filename, \"location\": page or row}}\n\n\
         {JSON_ONLY}",
        draft.content,
        format_references(&draft.references),
    );
    ModelRequest::new(Stage::Rewrite, system, section_line(title, instruction))
}

/// Case-insensitive search of every document for every term
///
/// Each match contributes one snippet of at most `snippet_chars` characters
/// around the first occurrence. Returns [`NO_NEW_INFORMATION`] when nothing
/// matched.
#[must_use]
pub fn targeted_search(documents: &[Document], search_terms: &[String], snippet_chars: usize) -> String {
    let mut found = Vec::new();

    for term in search_terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let Ok(pattern) = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };

        for doc in documents {
            if let Some(hit) = pattern.find(&doc.content) {
                let snippet = snippet_around(&doc.content, hit.start(), hit.end(), snippet_chars);
                found.push(format!("Found '{term}' in {}:\n{snippet}", doc.filename));
            }
        }
    }

    if found.is_empty() {
        NO_NEW_INFORMATION.to_string()
    } else {
        found.join("\n")
    }
}

/// Window of at most `max_chars` characters centred on `start..end`
fn snippet_around(content: &str, start: usize, end: usize, max_chars: usize) -> String {
    let match_chars = content[start..end].chars().count();
    let lead_budget = max_chars.saturating_sub(match_chars) / 2;

    let from = content[..start]
        .char_indices()
        .rev()
        .take(lead_budget)
        .last()
        .map_or(start, |(idx, _)| idx);
    let used = content[from..start].chars().count() + match_chars;
    let tail_budget = max_chars.saturating_sub(used);
    let to = content[end..]
        .char_indices()
        .nth(tail_budget)
        .map_or(content.len(), |(idx, _)| end + idx);

    let mut snippet = String::new();
    if from > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(content[from..to].trim());
    if to < content.len() {
        snippet.push_str("...");
    }
    snippet
}
