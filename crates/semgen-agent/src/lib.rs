//! semgen Agent - semantic model generation pipeline
//!
//! Drives an LLM through a small state machine to turn a database schema
//! into an OSI semantic model:
//!
//! - **plan**: decide what to inspect
//! - **discover**: inspect the schema through catalog tools
//! - **generate**: produce a candidate model
//! - **validate**: structural gate (default) or LLM gate, with bounded retries
//! - **persist**: store the model, annotated when it is degraded
//!
//! Progress goes to a [`ProgressReporter`] on a best-effort basis.
//!
//! # Example
//!
//! ```rust,no_run
//! use semgen_agent::{
//!     FsModelRepository, LlmConfig, OpenAiChatModel, RunRequest, SemanticModelAgent,
//!     SnapshotCatalog,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = OpenAiChatModel::from_env(&LlmConfig::default())?;
//! let catalog = SnapshotCatalog::load("catalog.json").await?;
//! let agent = SemanticModelAgent::new(
//!     Arc::new(llm),
//!     Arc::new(catalog),
//!     Arc::new(FsModelRepository::new("models")),
//! );
//!
//! let outcome = agent.run(RunRequest::new().with_tables(["orders"])).await;
//! println!("{:?}", outcome.status);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod nodes;
pub mod progress;
pub mod prompts;
pub mod repository;
pub mod state;

// Re-exports for convenience
pub use catalog::{
    ColumnInfo, DiscoveryTools, ForeignKey, SchemaCatalog, SnapshotCatalog, TableSchema,
    TableSnapshot,
};
pub use config::{AgentConfig, LlmConfig, ValidationPolicy};
pub use error::{AgentError, CatalogError, LlmError, ProgressError, RepositoryError};
pub use graph::{route_after_validation, AgentOutcome, Route, SemanticModelAgent};
pub use llm::{
    extract_json, ChatMessage, ChatModel, ChatResponse, OpenAiChatModel, Role, ToolCall,
    ToolDefinition,
};
pub use nodes::NodeContext;
pub use progress::{
    report_progress_best_effort, NoopProgressReporter, PipelineStep, ProgressReporter,
    RunProgress, StepProgress, StepStatus, TracingProgressReporter,
};
pub use repository::{FsModelRepository, InMemoryModelRepository, ModelRecord, ModelRepository};
pub use state::{AgentState, QualityReview, RunRequest, RunStatus, StatePatch};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
