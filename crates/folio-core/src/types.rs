//! Core types for Folio
//!
//! Defines the data that flows through the section pipeline:
//! - Documents and the shared document set
//! - Section requests and the per-section working state
//! - Stage outputs (drafts, critiques, tables, graph specs)
//! - The finalized section snapshot handed to renderers

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

/// Model-calling stage of the section pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Initial draft from the documents
    Extraction,
    /// Critique of the current draft
    Review,
    /// Revision driven by a critique
    Rewrite,
    /// Tabular data derivation
    Table,
    /// Chart specification derivation
    Graph,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 5] = [
        Stage::Extraction,
        Stage::Review,
        Stage::Rewrite,
        Stage::Table,
        Stage::Graph,
    ];

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Review => "review",
            Stage::Rewrite => "rewrite",
            Stage::Table => "table",
            Stage::Graph => "graph",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded input document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name used for citations
    pub filename: String,
    /// Normalized text content
    pub content: String,
    /// Loader metadata (`type`, `pages`, `rows`, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document without metadata
    #[inline]
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// With a metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Document type tag (`text`, `csv`, ...), if the loader recorded one
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }
}

/// Shared, read-only set of documents for a whole run
///
/// Cloning shares the underlying slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet(Arc<[Document]>);

impl DocumentSet {
    /// Create a document set
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self(documents.into())
    }

    /// Total content length in bytes
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.0.iter().map(|d| d.content.len()).sum()
    }
}

impl Deref for DocumentSet {
    type Target = [Document];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Document>> for DocumentSet {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}

/// One requested report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Section title
    #[serde(alias = "name")]
    pub title: String,
    /// Free-text guidance for this section
    #[serde(default, alias = "section_instructions")]
    pub instruction: String,
    /// Whether the renderer should show the table
    #[serde(default)]
    pub include_table: bool,
    /// Whether the renderer should show the chart
    #[serde(default, alias = "include_graphs")]
    pub include_graph: bool,
}

impl SectionSpec {
    /// Create a section request without table or graph
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            instruction: instruction.into(),
            include_table: false,
            include_graph: false,
        }
    }

    /// With table flag
    #[inline]
    #[must_use]
    pub fn with_table(mut self, include: bool) -> Self {
        self.include_table = include;
        self
    }

    /// With graph flag
    #[inline]
    #[must_use]
    pub fn with_graph(mut self, include: bool) -> Self {
        self.include_graph = include;
        self
    }
}

/// Citation attached to section content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Source document file name
    #[serde(default, deserialize_with = "lenient_string")]
    pub document: String,
    /// Page, row or other location inside the document
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
}

impl Reference {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(document: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            location: location.into(),
        }
    }
}

/// Accepts strings, numbers, booleans and null where a string is expected.
///
/// Models regularly emit `"location": 5` for row numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Section body together with its citations
///
/// Content and references always travel together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Section body
    pub content: String,
    /// Citations for `content`
    pub references: Vec<Reference>,
}

impl Draft {
    /// Create a draft
    #[inline]
    #[must_use]
    pub fn new(content: impl Into<String>, references: Vec<Reference>) -> Self {
        Self {
            content: content.into(),
            references,
        }
    }
}

/// Reviewer feedback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    /// Points that need more depth
    #[serde(default)]
    pub expand_on: Vec<String>,
    /// Statements to drop or reword
    #[serde(default)]
    pub remove_or_rephrase: Vec<String>,
    /// Terms to search the documents for
    #[serde(default)]
    pub search_terms: Vec<String>,
}

impl Critique {
    /// True when the critique asks for a rewrite
    #[inline]
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        !self.expand_on.is_empty() || !self.remove_or_rephrase.is_empty()
    }

    /// True when every list is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expand_on.is_empty() && self.remove_or_rephrase.is_empty() && self.search_terms.is_empty()
    }
}

/// Tabular data for a section
///
/// `{title: "", rows: []}` is the legitimate "no table found" result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularData {
    /// Table caption
    #[serde(default)]
    pub title: String,
    /// Rows keyed by column header, in model order
    #[serde(default)]
    pub rows: Vec<IndexMap<String, Value>>,
}

impl TabularData {
    /// The empty-result sentinel
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True for the empty-result sentinel
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.rows.is_empty()
    }

    /// Column headers in first-seen order across all rows
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
        columns
    }
}

/// Chart type of a graph spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    /// Bar chart
    Bar,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
    /// Prose stands in for a chart
    TextualDescription,
    /// Nothing worth charting
    #[default]
    None,
}

impl GraphKind {
    /// True for chart types with a structured series payload
    #[inline]
    #[must_use]
    pub fn is_chart(&self) -> bool {
        matches!(self, GraphKind::Bar | GraphKind::Line | GraphKind::Pie)
    }
}

/// Chart specification (or its textual substitute)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Chart title
    #[serde(default)]
    pub title: String,
    /// Chart type
    #[serde(rename = "type", default)]
    pub kind: GraphKind,
    /// Series payload for charts, prose for `textual_description`
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl GraphSpec {
    /// The empty-result sentinel `{title: "", type: "none", data: {}}`
    #[must_use]
    pub fn none() -> Self {
        Self {
            title: String::new(),
            kind: GraphKind::None,
            data: empty_object(),
        }
    }

    /// Textual substitute for a chart
    #[must_use]
    pub fn textual(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: GraphKind::TextualDescription,
            data: Value::String(description.into()),
        }
    }

    /// Check that `data` matches the declared type
    ///
    /// # Errors
    /// Returns a description of the mismatch.
    pub fn check_shape(&self) -> Result<(), String> {
        match self.kind {
            GraphKind::TextualDescription if !self.data.is_string() => Err(format!(
                "textual_description graph '{}' must carry prose data",
                self.title
            )),
            kind if kind.is_chart() && !(self.data.is_object() || self.data.is_array()) => Err(
                format!("{kind:?} graph '{}' must carry structured data", self.title),
            ),
            _ => Ok(()),
        }
    }
}

/// Recorded stage failure inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFault {
    /// Stage that failed
    pub stage: Stage,
    /// Failure description
    pub message: String,
}

/// Partial update produced by one stage and merged by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    /// Extraction produced a first draft
    Drafted(Draft),
    /// Review produced a critique (`None` when the review failed)
    Reviewed(Option<Critique>),
    /// Writer ran; `None` keeps the previous draft
    Rewritten(Option<Draft>),
    /// Table stage result (`None` when it failed or was gated off)
    Tabulated(Option<TabularData>),
    /// Graph stage result
    Charted(Vec<GraphSpec>),
}

/// Working record for one section's traversal
#[derive(Debug, Clone, PartialEq)]
pub struct SectionState {
    /// Shared documents
    pub documents: DocumentSet,
    /// Section title
    pub title: String,
    /// Section instruction
    pub instruction: String,
    /// Renderer table flag
    pub include_table: bool,
    /// Renderer graph flag
    pub include_graph: bool,
    draft: Draft,
    /// Latest critique
    pub critique: Option<Critique>,
    /// Writer invocations so far
    pub loop_count: u32,
    /// Table stage output
    pub tabular_data: Option<TabularData>,
    /// Graph stage output
    pub graph_specs: Vec<GraphSpec>,
    /// Earlier sections of the same run, read-only
    pub prior_sections: Arc<[FinalizedSection]>,
    /// Recoverable failures recorded along the way
    pub faults: Vec<StageFault>,
}

impl SectionState {
    /// Fresh state for a section
    #[must_use]
    pub fn new(documents: DocumentSet, spec: &SectionSpec) -> Self {
        Self {
            documents,
            title: spec.title.clone(),
            instruction: spec.instruction.clone(),
            include_table: spec.include_table,
            include_graph: spec.include_graph,
            draft: Draft::default(),
            critique: None,
            loop_count: 0,
            tabular_data: None,
            graph_specs: Vec::new(),
            prior_sections: Arc::from(Vec::new()),
            faults: Vec::new(),
        }
    }

    /// With earlier finalized sections as context
    #[must_use]
    pub fn with_prior_sections(mut self, prior: Arc<[FinalizedSection]>) -> Self {
        self.prior_sections = prior;
        self
    }

    /// Current section body
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.draft.content
    }

    /// Citations for the current body
    #[inline]
    #[must_use]
    pub fn references(&self) -> &[Reference] {
        &self.draft.references
    }

    /// Current draft
    #[inline]
    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Merge a stage update
    pub fn apply(&mut self, update: StageUpdate) {
        match update {
            StageUpdate::Drafted(draft) => self.draft = draft,
            StageUpdate::Reviewed(critique) => self.critique = critique,
            StageUpdate::Rewritten(draft) => {
                if let Some(draft) = draft {
                    self.draft = draft;
                }
                self.loop_count += 1;
            }
            StageUpdate::Tabulated(table) => self.tabular_data = table,
            StageUpdate::Charted(specs) => self.graph_specs = specs,
        }
    }

    /// Record a recoverable stage failure
    pub fn record_fault(&mut self, stage: Stage, message: impl Into<String>) {
        self.faults.push(StageFault {
            stage,
            message: message.into(),
        });
    }

    /// Immutable snapshot of the section
    #[must_use]
    pub fn finalize(&self) -> FinalizedSection {
        FinalizedSection {
            section: self.title.clone(),
            instruction: self.instruction.clone(),
            content: self.draft.content.clone(),
            references: self.draft.references.clone(),
            tabular_data: self.tabular_data.clone(),
            graph_specs: self.graph_specs.clone(),
            include_table: self.include_table,
            include_graph: self.include_graph,
            loop_count: self.loop_count,
            faults: self.faults.clone(),
        }
    }
}

/// Output unit of the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedSection {
    /// Section title
    pub section: String,
    /// Section instruction
    #[serde(default)]
    pub instruction: String,
    /// Final body
    pub content: String,
    /// Final citations
    #[serde(default)]
    pub references: Vec<Reference>,
    /// Table output, `None` when the stage did not produce one
    #[serde(default)]
    pub tabular_data: Option<TabularData>,
    /// Graph output
    #[serde(default)]
    pub graph_specs: Vec<GraphSpec>,
    /// Renderer table flag
    #[serde(default)]
    pub include_table: bool,
    /// Renderer graph flag
    #[serde(default)]
    pub include_graph: bool,
    /// Rewrite cycles performed
    #[serde(default)]
    pub loop_count: u32,
    /// Stages that degraded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<StageFault>,
}
