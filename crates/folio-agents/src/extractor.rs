//! Extractor role
//!
//! Produces the first draft of a section straight from the documents, with
//! a citation (document plus page or row) for each fact.

use crate::gateway::{ModelGateway, ModelRequest};
use crate::prompt::{format_documents, format_prior_sections, section_line, JSON_ONLY};
use folio_core::{
    parse_response, Document, Draft, FinalizedSection, Reference, Stage, StageError,
    NO_INFORMATION_PLACEHOLDER,
};
use serde::Deserialize;
use std::sync::Arc;

/// Extraction response schema
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    references: Vec<Reference>,
}

impl ExtractionResponse {
    fn into_draft(self) -> Draft {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| NO_INFORMATION_PLACEHOLDER.to_string());
        Draft::new(content, self.references)
    }
}

/// Drafts section content from the document set
#[derive(Clone)]
pub struct Extractor {
    gateway: Arc<dyn ModelGateway>,
}

impl Extractor {
    /// Create new extractor
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Draft a section
    ///
    /// # Errors
    /// - `StageError::InvalidInput` for an empty document set or blank title
    /// - `StageError::Extraction` for model or parse failures
    pub async fn extract(
        &self,
        documents: &[Document],
        title: &str,
        instruction: &str,
    ) -> Result<Draft, StageError> {
        self.extract_with_context(documents, title, instruction, &[])
            .await
    }

    /// Draft a section with earlier sections offered as context
    ///
    /// # Errors
    /// See [`Extractor::extract`].
    pub async fn extract_with_context(
        &self,
        documents: &[Document],
        title: &str,
        instruction: &str,
        prior: &[FinalizedSection],
    ) -> Result<Draft, StageError> {
        if documents.is_empty() {
            return Err(StageError::InvalidInput(format!(
                "no documents available to extract '{title}'"
            )));
        }
        if title.trim().is_empty() {
            return Err(StageError::InvalidInput("section title is empty".into()));
        }

        let request = build_request(documents, title, instruction, prior);
        tracing::info!(section = %title, documents = documents.len(), "extracting section");

        let raw = self
            .gateway
            .complete(&request)
            .await
            .map_err(|e| StageError::for_stage(Stage::Extraction, title, e))?;
        let response: ExtractionResponse =
            parse_response(&raw).map_err(|e| StageError::for_stage(Stage::Extraction, title, e))?;

        let draft = response.into_draft();
        tracing::debug!(
            section = %title,
            chars = draft.content.len(),
            references = draft.references.len(),
            "initial draft created"
        );
        Ok(draft)
    }
}

fn build_request(
    documents: &[Document],
    title: &str,
    instruction: &str,
    prior: &[FinalizedSection],
) -> ModelRequest {
    let system = format!(
        "You are an expert financial analyst. Extract the information relevant to the \
         \"{title}\" section of a portfolio analysis report from the documents provided.\n\n\
         Focus on factual information and key insights. Cite the source of every fact: \
         for CSV content give the filename and row number, for text, PDF or Word content \
         give the filename and page number.\n\n\
         Output keys:\n\
         - \"content\": the draft section text. If nothing relevant is found, set it to \
         \"{NO_INFORMATION_PLACEHOLDER}\"\n\
         - \"references\": a list of {{\"document\": filename, \"location\": page or row}}\n\n\
         {JSON_ONLY}"
    );

    let mut user = format!("Documents:\n{}\n\n", format_documents(documents));
    if let Some(context) = format_prior_sections(prior) {
        user.push_str(&context);
        user.push('\n');
    }
    user.push_str(&section_line(title, instruction));

    ModelRequest::new(Stage::Extraction, system, user)
}
