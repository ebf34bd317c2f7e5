//! Error types for the generation agent
//!
//! Provides error handling for the agent's collaborators:
//! - LLM invocation failures (with retry classification)
//! - Schema catalog lookups
//! - Model persistence
//! - Progress reporting
//! - Pipeline step failures ([`AgentError`])

use std::path::PathBuf;

/// LLM invocation errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Connection or protocol failure
    #[error("llm transport error: {0}")]
    Transport(String),

    /// Request did not complete in time
    #[error("llm request timed out")]
    Timeout,

    /// Provider answered with a non-success status
    #[error("llm provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider response could not be decoded
    #[error("llm response decode failed: {0}")]
    Decode(String),

    /// Provider returned no choices
    #[error("llm returned an empty response")]
    EmptyResponse,

    /// Client is misconfigured
    #[error("llm configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::EmptyResponse => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

/// Schema catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Table does not exist in the catalog
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Snapshot could not be read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON
    #[error("invalid catalog snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    /// Backend specific failure
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Model persistence errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Filesystem failure
    #[error("io error writing {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Record could not be encoded
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Backend specific failure
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Progress reporting errors
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Reporting backend unreachable
    #[error("progress backend unavailable: {0}")]
    Unavailable(String),

    /// Run unknown to the backend
    #[error("unknown run: {0}")]
    UnknownRun(uuid::Uuid),
}

/// Pipeline step failures that end a run
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// LLM call failed
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Catalog lookup failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Persistence failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Validation attempts exhausted without an acceptable model
    #[error("Semantic model validation failed after {attempts} attempts")]
    ValidationExhausted { attempts: u32 },
}

impl AgentError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_retryable(),
            Self::Catalog(_) | Self::Repository(_) | Self::ValidationExhausted { .. } => false,
        }
    }
}
