//! Graph generator role
//!
//! Proposes chart specifications for a section. A model may answer with one
//! spec object or an array of them; both are accepted. Specs whose `data`
//! does not fit the declared type are rejected as a schema error.

use crate::gateway::{ModelGateway, ModelRequest};
use crate::prompt::{format_documents, JSON_ONLY};
use folio_core::{
    parse_response, Document, GraphSpec, ResponseError, Stage, StageError, TabularData,
};
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM: &str = "You are an expert at identifying data suitable for graphical \
representation. From the documents, the section content and its table (if any), find trends, \
comparisons or distributions worth visualizing and propose a graph.\n\n\
Output keys:\n\
- \"title\": chart title\n\
- \"type\": one of \"bar\", \"line\", \"pie\", \"textual_description\", \"none\"\n\
- \"data\": for bar/line/pie a Chart.js style object {\"labels\": [...], \"datasets\": \
[{\"label\": ..., \"data\": [...]}]}; for textual_description a prose string\n\n\
If a textual description fits better than a chart, use type \"textual_description\". If \
nothing is worth visualizing, return {\"title\": \"\", \"type\": \"none\", \"data\": {}}.";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GraphResponse {
    Many(Vec<GraphSpec>),
    One(GraphSpec),
}

impl GraphResponse {
    fn into_specs(self) -> Vec<GraphSpec> {
        match self {
            GraphResponse::Many(specs) => specs,
            GraphResponse::One(spec) => vec![spec],
        }
    }
}

/// Derives chart specifications for a section
#[derive(Clone)]
pub struct GraphGenerator {
    gateway: Arc<dyn ModelGateway>,
}

impl GraphGenerator {
    /// Create new graph generator
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Generate graph specs
    ///
    /// The `none` sentinel comes back as a single spec of kind `None`.
    ///
    /// # Errors
    /// `StageError::GraphGeneration` for model, parse or shape failures.
    pub async fn generate_graph(
        &self,
        documents: &[Document],
        title: &str,
        content: &str,
        tabular_data: Option<&TabularData>,
    ) -> Result<Vec<GraphSpec>, StageError> {
        let table = tabular_data
            .and_then(|t| serde_json::to_string(t).ok())
            .unwrap_or_else(|| "{}".to_string());
        let request = ModelRequest::new(
            Stage::Graph,
            format!("{SYSTEM}\n\n{JSON_ONLY}"),
            format!(
                "All Documents:\n{}\n\nCurrent Section Title: {title}\nCurrent Section Content:\n{content}\n\n\
                 Tabular Data for Current Section (if available): {table}",
                format_documents(documents)
            ),
        );
        tracing::info!(section = %title, "generating graph");

        let raw = self
            .gateway
            .complete(&request)
            .await
            .map_err(|e| StageError::for_stage(Stage::Graph, title, e))?;
        let specs = parse_response::<GraphResponse>(&raw)
            .map_err(|e| StageError::for_stage(Stage::Graph, title, e))?
            .into_specs();

        for spec in &specs {
            spec.check_shape().map_err(|reason| {
                StageError::for_stage(Stage::Graph, title, ResponseError::Schema { reason })
            })?;
        }

        tracing::debug!(section = %title, specs = specs.len(), "graph specs generated");
        Ok(specs)
    }
}
