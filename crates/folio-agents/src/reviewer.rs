//! Reviewer role
//!
//! Critiques the current draft. An all-empty critique is a valid answer
//! meaning "nothing left to improve".

use crate::gateway::{ModelGateway, ModelRequest};
use crate::prompt::{format_references, JSON_ONLY};
use folio_core::{parse_response, Critique, Reference, Stage, StageError};
use std::sync::Arc;

const SYSTEM: &str = "You are a meticulous senior reviewer of portfolio analysis reports. \
Critique the draft section below for accuracy, completeness, clarity and support by its \
references.\n\n\
Output keys (each a list of strings, empty when there is nothing to report):\n\
- \"expand_on\": points that need more depth or supporting figures\n\
- \"remove_or_rephrase\": statements that are unsupported, redundant or unclear\n\
- \"search_terms\": short keywords to search the source documents for missing evidence\n\n\
If the section is already good, return empty lists.";

/// Critiques section drafts
#[derive(Clone)]
pub struct Reviewer {
    gateway: Arc<dyn ModelGateway>,
}

impl Reviewer {
    /// Create new reviewer
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Critique a draft
    ///
    /// # Errors
    /// - `StageError::InvalidInput` when `content` is empty
    /// - `StageError::Review` for model or parse failures
    pub async fn review(
        &self,
        title: &str,
        content: &str,
        references: &[Reference],
    ) -> Result<Critique, StageError> {
        if content.trim().is_empty() {
            return Err(StageError::InvalidInput(format!(
                "section '{title}' has no content to review"
            )));
        }

        let request = ModelRequest::new(
            Stage::Review,
            format!("{SYSTEM}\n\n{JSON_ONLY}"),
            format!(
                "Section Title: {title}\n\nDraft:\n{content}\n\nReferences:\n{}",
                format_references(references)
            ),
        );
        tracing::info!(section = %title, "reviewing section");

        let raw = self
            .gateway
            .complete(&request)
            .await
            .map_err(|e| StageError::for_stage(Stage::Review, title, e))?;
        let critique: Critique =
            parse_response(&raw).map_err(|e| StageError::for_stage(Stage::Review, title, e))?;

        tracing::debug!(
            section = %title,
            expand_on = critique.expand_on.len(),
            remove_or_rephrase = critique.remove_or_rephrase.len(),
            search_terms = critique.search_terms.len(),
            "critique received"
        );
        Ok(critique)
    }
}
