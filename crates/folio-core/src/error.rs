//! Error types for Folio Core
//!
//! Provides the error taxonomy of the section pipeline:
//! - Model gateway failures (transport, status, timeout)
//! - Response failures (empty, malformed, wrong shape)
//! - Stage errors: invalid input vs. recoverable per-stage faults
//! - Configuration errors

use crate::types::Stage;

/// Model gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network or client failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Call exceeded its deadline
    #[error("model call timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Completion carried no text
    #[error("model returned an empty completion")]
    EmptyResponse,

    /// API key variable not set
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    /// Call abandoned by cancellation
    #[error("model call cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Check if a retry could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } | Self::EmptyResponse => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey(_) | Self::Cancelled => false,
        }
    }
}

/// Model response parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Nothing left after trimming
    #[error("response is empty")]
    Empty,

    /// Not valid JSON
    #[error("response is not valid JSON: {reason}")]
    Malformed { reason: String },

    /// Valid JSON of the wrong shape
    #[error("response does not match the expected schema: {reason}")]
    Schema { reason: String },
}

/// Underlying cause of a stage failure
#[derive(Debug, thiserror::Error)]
pub enum StageCause {
    /// Model call failed
    #[error(transparent)]
    Model(#[from] GatewayError),

    /// Model answered with an unusable response
    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Stage errors
///
/// `InvalidInput` is a precondition violation of a single operation. Every
/// other variant is recoverable: the state machine records it and carries on.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Caller violated a precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Extractor failed
    #[error("extraction failed for '{title}': {cause}")]
    Extraction { title: String, cause: StageCause },

    /// Reviewer failed
    #[error("review failed for '{title}': {cause}")]
    Review { title: String, cause: StageCause },

    /// Writer failed
    #[error("rewrite failed for '{title}': {cause}")]
    Rewrite { title: String, cause: StageCause },

    /// Table generator failed
    #[error("table generation failed for '{title}': {cause}")]
    TableGeneration { title: String, cause: StageCause },

    /// Graph generator failed
    #[error("graph generation failed for '{title}': {cause}")]
    GraphGeneration { title: String, cause: StageCause },
}

impl StageError {
    /// Build the stage-specific error variant
    #[must_use]
    pub fn for_stage(stage: Stage, title: impl Into<String>, cause: impl Into<StageCause>) -> Self {
        let title = title.into();
        let cause = cause.into();
        match stage {
            Stage::Extraction => Self::Extraction { title, cause },
            Stage::Review => Self::Review { title, cause },
            Stage::Rewrite => Self::Rewrite { title, cause },
            Stage::Table => Self::TableGeneration { title, cause },
            Stage::Graph => Self::GraphGeneration { title, cause },
        }
    }

    /// Check if the section can continue past this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }

    /// Stage the error belongs to (`None` for invalid input)
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Extraction { .. } => Some(Stage::Extraction),
            Self::Review { .. } => Some(Stage::Review),
            Self::Rewrite { .. } => Some(Stage::Rewrite),
            Self::TableGeneration { .. } => Some(Stage::Table),
            Self::GraphGeneration { .. } => Some(Stage::Graph),
        }
    }

    /// Underlying cause, if any
    #[must_use]
    pub fn cause(&self) -> Option<&StageCause> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Extraction { cause, .. }
            | Self::Review { cause, .. }
            | Self::Rewrite { cause, .. }
            | Self::TableGeneration { cause, .. }
            | Self::GraphGeneration { cause, .. } => Some(cause),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
