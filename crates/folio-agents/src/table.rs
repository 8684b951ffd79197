//! Table generator role

use crate::gateway::{ModelGateway, ModelRequest};
use crate::prompt::{format_documents, JSON_ONLY};
use folio_core::{parse_response, Document, Stage, StageError, TabularData};
use serde_json::Value;
use std::sync::Arc;

const SYSTEM: &str = "You are an expert at summarizing information into tabular form. From the \
documents and the current section content, identify the key numerical or categorical data \
points relevant to the section and summarize them in one well-structured table.\n\n\
Output keys:\n\
- \"title\": table caption\n\
- \"rows\": list of objects whose keys are the column headers and whose values are strings or numbers\n\n\
If no relevant tabular data exists, return {\"title\": \"\", \"rows\": []}.\n\n\
Example: {\"title\": \"Financial Highlights Q1 2025\", \"rows\": [{\"Metric\": \"Revenue\", \
\"Value\": \"$10M\", \"Change\": \"+15%\"}]}";

/// Derives a table for a section
#[derive(Clone)]
pub struct TableGenerator {
    gateway: Arc<dyn ModelGateway>,
}

impl TableGenerator {
    /// Create new table generator
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Generate a table; `{title: "", rows: []}` means "no table found"
    ///
    /// # Errors
    /// `StageError::TableGeneration` for model or parse failures.
    pub async fn generate_table(
        &self,
        documents: &[Document],
        title: &str,
        content: &str,
    ) -> Result<TabularData, StageError> {
        let request = ModelRequest::new(
            Stage::Table,
            format!("{SYSTEM}\n\n{JSON_ONLY}"),
            format!(
                "All Documents:\n{}\n\nCurrent Section Title: {title}\nCurrent Section Content:\n{content}",
                format_documents(documents)
            ),
        );
        tracing::info!(section = %title, "generating table");

        let raw = self
            .gateway
            .complete(&request)
            .await
            .map_err(|e| StageError::for_stage(Stage::Table, title, e))?;
        let mut table: TabularData =
            parse_response(&raw).map_err(|e| StageError::for_stage(Stage::Table, title, e))?;

        flatten_cells(&mut table);
        tracing::debug!(section = %title, rows = table.rows.len(), "table generated");
        Ok(table)
    }
}

/// Cells are scalars; nested values are kept as their JSON text
fn flatten_cells(table: &mut TabularData) {
    for cell in table.rows.iter_mut().flat_map(|row| row.values_mut()) {
        if cell.is_object() || cell.is_array() {
            *cell = Value::String(cell.to_string());
        }
    }
}
