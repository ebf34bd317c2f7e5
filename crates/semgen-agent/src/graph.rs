//! Semantic model agent
//!
//! Runs the pipeline
//!
//! ```text
//! plan -> discover -> generate -> validate -> persist
//!                        ^           |
//!                        +-----------+  (no model, attempts left)
//! ```
//!
//! and reports progress before each step. Terminal failures still go
//! through persist so the failure is recorded.

use crate::catalog::SchemaCatalog;
use crate::config::AgentConfig;
use crate::error::{AgentError, LlmError};
use crate::llm::ChatModel;
use crate::nodes::{self, NodeContext};
use crate::progress::{
    report_progress_best_effort, PipelineStep, ProgressReporter, RunProgress,
    TracingProgressReporter,
};
use crate::repository::ModelRepository;
use crate::state::{AgentState, RunRequest, RunStatus, StatePatch};
use semgen_osi::OsiSpecProvider;
use std::sync::Arc;

/// Where the run goes after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Store the candidate
    Persist,
    /// Try generating again
    Regenerate,
    /// Attempts exhausted
    Fail,
}

/// Routing decision after the validate step
#[must_use]
pub fn route_after_validation(state: &AgentState, max_attempts: u32) -> Route {
    if state.semantic_model.is_some() {
        Route::Persist
    } else if state.validation_attempts < max_attempts {
        Route::Regenerate
    } else {
        Route::Fail
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Final state
    pub state: AgentState,
    /// Final status
    pub status: RunStatus,
}

impl AgentOutcome {
    fn from_state(state: AgentState) -> Self {
        Self {
            status: state.status(),
            state,
        }
    }

    /// Whether a model was stored
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Semantic model generation agent
pub struct SemanticModelAgent {
    ctx: NodeContext,
    progress: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for SemanticModelAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticModelAgent")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl SemanticModelAgent {
    /// Create agent with default configuration
    ///
    /// Uses the bundled OSI specification and logs progress through tracing
    /// until configured otherwise.
    #[must_use]
    pub fn new(
        llm: Arc<dyn ChatModel>,
        catalog: Arc<dyn SchemaCatalog>,
        repository: Arc<dyn ModelRepository>,
    ) -> Self {
        Self {
            ctx: NodeContext::new(llm, catalog, repository),
            progress: Arc::new(TracingProgressReporter),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.ctx = self.ctx.with_config(config);
        self
    }

    /// With specification provider
    #[inline]
    #[must_use]
    pub fn with_spec_provider(mut self, spec: OsiSpecProvider) -> Self {
        self.ctx = self.ctx.with_spec_provider(spec);
        self
    }

    /// With progress reporter
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.ctx.config
    }

    /// Run the pipeline to completion
    ///
    /// Never returns an error: failures end up in the outcome status and the
    /// state's `error`.
    pub async fn run(&self, request: RunRequest) -> AgentOutcome {
        let mut state = AgentState::new(request);
        tracing::info!(
            run_id = %state.run_id,
            model = self.ctx.llm.model_name(),
            policy = ?self.ctx.config.validation_policy,
            "starting semantic model generation"
        );

        if state.tables.is_empty() {
            match self.ctx.catalog.list_tables().await {
                Ok(tables) => state.tables = tables,
                Err(e) => return self.fail(state, PipelineStep::Plan, &AgentError::from(e)).await,
            }
        }

        self.report(&state, PipelineStep::Plan).await;
        let patch = nodes::plan(&self.ctx, &state).await;
        state.apply(patch);
        if state.error.is_some() {
            return self.finish_failed(state, PipelineStep::Plan).await;
        }

        self.report(&state, PipelineStep::Discover).await;
        let patch = nodes::discover(&self.ctx, &state).await;
        state.apply(patch);
        if state.error.is_some() {
            return self.finish_failed(state, PipelineStep::Discover).await;
        }

        loop {
            self.report(&state, PipelineStep::Generate).await;
            match self.generate_with_retry(&state).await {
                Ok(patch) => state.apply(patch),
                Err(e) => {
                    return self
                        .fail(state, PipelineStep::Generate, &AgentError::from(e))
                        .await
                }
            }

            self.report(&state, PipelineStep::Validate).await;
            let patch = nodes::validate(&self.ctx, &state).await;
            state.apply(patch);

            match route_after_validation(&state, self.ctx.config.max_validation_attempts) {
                Route::Persist => break,
                Route::Regenerate => {
                    tracing::info!(
                        run_id = %state.run_id,
                        attempt = state.validation_attempts,
                        max = self.ctx.config.max_validation_attempts,
                        "no acceptable model, regenerating"
                    );
                }
                Route::Fail => {
                    let error = AgentError::ValidationExhausted {
                        attempts: state.validation_attempts,
                    };
                    return self.fail(state, PipelineStep::Validate, &error).await;
                }
            }
        }

        self.report(&state, PipelineStep::Persist).await;
        let patch = nodes::persist(&self.ctx, &state).await;
        state.apply(patch);

        let outcome = AgentOutcome::from_state(state);
        let failed = !outcome.is_success();
        self.report_finished(&outcome.state, PipelineStep::Persist, failed)
            .await;

        tracing::info!(
            run_id = %outcome.state.run_id,
            status = ?outcome.status,
            attempts = outcome.state.validation_attempts,
            tokens = outcome.state.token_usage.total,
            "semantic model generation finished"
        );
        outcome
    }

    /// Run generate, retrying transient LLM errors with linear backoff
    async fn generate_with_retry(&self, state: &AgentState) -> Result<StatePatch, LlmError> {
        let mut retry = 0;
        loop {
            match nodes::generate(&self.ctx, state).await {
                Ok(patch) => return Ok(patch),
                Err(e) if e.is_retryable() && retry < self.ctx.config.llm_retry_limit => {
                    retry += 1;
                    let backoff = self.ctx.config.retry_backoff(retry);
                    tracing::warn!(
                        run_id = %state.run_id,
                        retry,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "generation failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Record a terminal error and finish failed
    async fn fail(&self, mut state: AgentState, step: PipelineStep, error: &AgentError) -> AgentOutcome {
        state.apply(StatePatch::new().with_error(error.to_string()));
        self.finish_failed(state, step).await
    }

    /// Persist the failure and report the final snapshot
    async fn finish_failed(&self, mut state: AgentState, step: PipelineStep) -> AgentOutcome {
        tracing::error!(
            run_id = %state.run_id,
            step = step.key(),
            error = state.error.as_deref().unwrap_or_default(),
            "semantic model generation failed"
        );

        // Drop any candidate so the record is marked failed
        state.apply(StatePatch::new().clear_model());
        let patch = nodes::persist(&self.ctx, &state).await;
        state.apply(patch);
        self.report_finished(&state, step, true).await;

        AgentOutcome {
            state,
            status: RunStatus::Failed,
        }
    }

    async fn report(&self, state: &AgentState, step: PipelineStep) {
        report_progress_best_effort(
            self.progress.as_ref(),
            state.run_id,
            RunProgress::at(step, state.token_usage.total),
            self.ctx.config.progress_timeout(),
        )
        .await;
    }

    async fn report_finished(&self, state: &AgentState, step: PipelineStep, failed: bool) {
        report_progress_best_effort(
            self.progress.as_ref(),
            state.run_id,
            RunProgress::finished(step, state.token_usage.total, failed),
            self.ctx.config.progress_timeout(),
        )
        .await;
    }
}
