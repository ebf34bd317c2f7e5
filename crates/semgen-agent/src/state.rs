//! Agent state threaded through the pipeline
//!
//! Every node reads the current [`AgentState`] and returns a
//! [`StatePatch`]; the graph merges the patch before moving on. State is
//! passed by value between sequential steps, so nothing here is shared.

use crate::llm::ChatMessage;
use semgen_model::{SemanticModel, TokenUsage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input to one agent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Run identifier used for persistence and progress
    pub run_id: Uuid,
    /// Tables to model; empty means every table in the catalog
    #[serde(default)]
    pub tables: Vec<String>,
    /// Free-form guidance from the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl RunRequest {
    /// Request with a fresh run id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    /// Request with an explicit run id
    #[inline]
    #[must_use]
    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            tables: Vec::new(),
            instructions: None,
        }
    }

    /// With tables to model
    #[inline]
    #[must_use]
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// With caller instructions
    #[inline]
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

impl Default for RunRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Model stored without errors
    Completed,
    /// Model stored with an error annotation
    CompletedWithErrors,
    /// No model produced, or it could not be stored
    Failed,
}

impl RunStatus {
    /// Whether a model was produced and stored
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Outcome of the advisory quality review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum QualityReview {
    /// Reviewer found nothing to report
    Passed,
    /// Reviewer reported issues (advisory)
    IssuesFound(String),
    /// Review not attempted
    Skipped {
        /// Why the review was skipped
        reason: String,
    },
    /// Review call failed; the failure was ignored
    Failed(String),
}

/// Mutable record threaded through every node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Run identifier
    pub run_id: Uuid,
    /// Tables in scope
    pub tables: Vec<String>,
    /// Caller instructions
    pub instructions: Option<String>,
    /// Conversation history (audit trail of LLM exchanges)
    pub messages: Vec<ChatMessage>,
    /// Discovery plan from the plan step
    pub discovery_plan: Option<String>,
    /// Findings from the discovery step
    pub discovery_summary: Option<String>,
    /// Current candidate model
    pub semantic_model: Option<SemanticModel>,
    /// Validate step executions so far
    pub validation_attempts: u32,
    /// Feedback for the next generate step
    pub validation_feedback: Option<String>,
    /// Cumulative token usage
    pub token_usage: TokenUsage,
    /// Terminal or annotation error
    pub error: Option<String>,
    /// Non-blocking findings
    pub warnings: Vec<String>,
    /// Latest quality review outcome
    pub quality_review: Option<QualityReview>,
    /// Whether the persist step stored a record
    pub persisted: bool,
}

impl AgentState {
    /// Initial state for a run
    #[must_use]
    pub fn new(request: RunRequest) -> Self {
        Self {
            run_id: request.run_id,
            tables: request.tables,
            instructions: request.instructions,
            messages: Vec::new(),
            discovery_plan: None,
            discovery_summary: None,
            semantic_model: None,
            validation_attempts: 0,
            validation_feedback: None,
            token_usage: TokenUsage::default(),
            error: None,
            warnings: Vec::new(),
            quality_review: None,
            persisted: false,
        }
    }

    /// Merge a node's patch
    pub fn apply(&mut self, patch: StatePatch) {
        self.messages.extend(patch.messages);
        self.token_usage += patch.token_usage;
        self.warnings.extend(patch.warnings);

        if let Some(tables) = patch.tables {
            self.tables = tables;
        }
        if let Some(plan) = patch.discovery_plan {
            self.discovery_plan = Some(plan);
        }
        if let Some(summary) = patch.discovery_summary {
            self.discovery_summary = Some(summary);
        }
        if let Some(model) = patch.semantic_model {
            self.semantic_model = model;
        }
        if let Some(attempts) = patch.validation_attempts {
            self.validation_attempts = attempts;
        }
        if let Some(feedback) = patch.validation_feedback {
            self.validation_feedback = feedback;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(review) = patch.quality_review {
            self.quality_review = Some(review);
        }
        if let Some(persisted) = patch.persisted {
            self.persisted = persisted;
        }
    }

    /// Status implied by the current state
    #[must_use]
    pub fn status(&self) -> RunStatus {
        match (&self.semantic_model, self.persisted, &self.error) {
            (Some(_), true, None) => RunStatus::Completed,
            (Some(_), true, Some(_)) => RunStatus::CompletedWithErrors,
            _ => RunStatus::Failed,
        }
    }

    /// State after merging a patch
    #[inline]
    #[must_use]
    pub fn merged(mut self, patch: StatePatch) -> Self {
        self.apply(patch);
        self
    }
}

/// Partial update returned by a node
///
/// Lists are appended and usage is added. For `Option<Option<_>>` fields the
/// outer `None` leaves the state untouched and `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    /// Messages to append
    pub messages: Vec<ChatMessage>,
    /// Usage delta to add
    pub token_usage: TokenUsage,
    /// Warnings to append
    pub warnings: Vec<String>,
    /// Replacement table list
    pub tables: Option<Vec<String>>,
    /// Replacement discovery plan
    pub discovery_plan: Option<String>,
    /// Replacement discovery summary
    pub discovery_summary: Option<String>,
    /// Candidate model update
    pub semantic_model: Option<Option<SemanticModel>>,
    /// Replacement attempt counter
    pub validation_attempts: Option<u32>,
    /// Feedback update
    pub validation_feedback: Option<Option<String>>,
    /// Error update
    pub error: Option<Option<String>>,
    /// Quality review outcome
    pub quality_review: Option<QualityReview>,
    /// Persistence flag
    pub persisted: Option<bool>,
}

impl StatePatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add token usage
    #[inline]
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage += usage;
        self
    }

    /// Append a warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Replace the candidate model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: SemanticModel) -> Self {
        self.semantic_model = Some(Some(model));
        self
    }

    /// Clear the candidate model
    #[inline]
    #[must_use]
    pub fn clear_model(mut self) -> Self {
        self.semantic_model = Some(None);
        self
    }

    /// Set feedback for the next generate step
    #[inline]
    #[must_use]
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.validation_feedback = Some(Some(feedback.into()));
        self
    }

    /// Clear generate feedback
    #[inline]
    #[must_use]
    pub fn clear_feedback(mut self) -> Self {
        self.validation_feedback = Some(None);
        self
    }

    /// Set the run error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    /// Clear the run error
    #[inline]
    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }
}
