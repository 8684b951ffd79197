//! Run configuration
//!
//! `ReportConfig` carries every run-level knob: the review-loop budget, the
//! writer's snippet bound, optional behaviors and the model gateway settings.
//! It loads from TOML with every field defaulted, so a config file only has
//! to name what it changes.

use crate::error::ConfigError;
use crate::types::SectionSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Run-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rewrite cycles allowed per section
    pub max_review_loops: u32,
    /// Upper bound on each search snippet handed to the writer, in chars
    pub snippet_chars: usize,
    /// Offer earlier finalized sections to later extractions
    pub share_prior_sections: bool,
    /// Skip table/graph model calls when the section does not want them
    pub gate_outputs_on_flags: bool,
    /// Model gateway settings
    pub gateway: GatewayConfig,
    /// Sections to produce, in order
    pub sections: Vec<SectionSpec>,
}

impl ReportConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With review loop budget
    #[inline]
    #[must_use]
    pub fn with_max_review_loops(mut self, loops: u32) -> Self {
        self.max_review_loops = loops;
        self
    }

    /// With snippet bound
    #[inline]
    #[must_use]
    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    /// With prior-section sharing
    #[inline]
    #[must_use]
    pub fn with_shared_prior_sections(mut self, share: bool) -> Self {
        self.share_prior_sections = share;
        self
    }

    /// With table/graph gating on section flags
    #[inline]
    #[must_use]
    pub fn with_output_gating(mut self, gate: bool) -> Self {
        self.gate_outputs_on_flags = gate;
        self
    }

    /// With section list
    #[inline]
    #[must_use]
    pub fn with_sections(mut self, sections: Vec<SectionSpec>) -> Self {
        self.sections = sections;
        self
    }

    /// Load and validate a TOML config file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid TOML for this schema
    /// - `ConfigError::Invalid` if validation fails
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), sections = config.sections.len(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// See [`ReportConfig::from_toml_file`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::Invalid("at least one section is required".into()));
        }
        if let Some(idx) = self.sections.iter().position(|s| s.title.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("section {idx} has a blank title")));
        }
        if self.snippet_chars == 0 {
            return Err(ConfigError::Invalid("snippet_chars must be positive".into()));
        }
        self.gateway.validate()
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_review_loops: 2,
            snippet_chars: 200,
            share_prior_sections: false,
            gate_outputs_on_flags: false,
            gateway: GatewayConfig::default(),
            sections: default_sections(),
        }
    }
}

/// Model gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,
    /// Model name sent with each request
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-attempt deadline in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Initial backoff, doubled each retry
    pub retry_backoff_ms: u64,
}

impl GatewayConfig {
    /// Check value ranges
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.endpoint is blank".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.model is blank".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("gateway.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "FOLIO_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Default portfolio analysis sections
#[must_use]
pub fn default_sections() -> Vec<SectionSpec> {
    vec![
        SectionSpec::new(
            "Executive Summary",
            "Highlight the key investment thesis for the company and summarize the main financial and operating metrics. Keep it focused with each sub_section being 3-4 lines only",
        )
        .with_table(true)
        .with_graph(true),
        SectionSpec::new(
            "Overview",
            "Provide a brief overview of the company, including its history, mission, and key products or services. Also include founder and key management.",
        )
        .with_table(true),
        SectionSpec::new(
            "Strategic Insights",
            "Summarize the strategic insights from the annual report, focusing on the company's long-term vision and strategic initiatives. Do not generate markdown tables, just text",
        )
        .with_graph(true),
        SectionSpec::new(
            "Financial Review",
            "Analyze the financial performance of the company, including revenue, profit margins, and key financial ratios. Do not generate markdown tables, just text.",
        )
        .with_table(true)
        .with_graph(true),
        SectionSpec::new(
            "Risks",
            "Identify and analyze the key risks facing the company, including market, operational, and financial risks.",
        )
        .with_table(true),
    ]
}
