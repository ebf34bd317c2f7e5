//! Subcommand implementations

use crate::config::SemgenConfig;
use anyhow::{Context, Result};
use semgen_agent::{
    AgentOutcome, FsModelRepository, OpenAiChatModel, RunRequest, RunStatus, SemanticModelAgent,
    SnapshotCatalog, TracingProgressReporter,
};
use semgen_model::{validate_structure, SemanticModel, ValidationReport};
use semgen_osi::OsiSpecProvider;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Printed result of `semgen run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: Uuid,
    /// Final status
    pub status: RunStatus,
    /// Error annotation or failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Validation attempts used
    pub validation_attempts: u32,
    /// Total tokens consumed
    pub tokens_used: u64,
    /// Warnings raised along the way
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Record written for the run
    pub record: PathBuf,
}

impl RunSummary {
    /// Summarize an outcome
    #[must_use]
    pub fn new(outcome: &AgentOutcome, record: PathBuf) -> Self {
        let state = &outcome.state;
        Self {
            run_id: state.run_id,
            status: outcome.status,
            error: state.error.clone(),
            validation_attempts: state.validation_attempts,
            tokens_used: state.token_usage.total,
            warnings: state.warnings.clone(),
            record,
        }
    }

    /// Process exit code: 0 completed, 2 completed with errors, 1 failed
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Completed => 0,
            RunStatus::CompletedWithErrors => 2,
            RunStatus::Failed => 1,
        }
    }
}

/// Generate a model for the tables of a catalog snapshot
///
/// # Errors
/// Fails before the run starts when the catalog, API key or clients cannot
/// be set up. Failures during the run are reported in the summary.
pub async fn run(
    config: &SemgenConfig,
    catalog_path: &Path,
    request: RunRequest,
) -> Result<RunSummary> {
    let catalog = SnapshotCatalog::load(catalog_path)
        .await
        .with_context(|| format!("loading catalog snapshot {}", catalog_path.display()))?;
    let api_key = config.api_key()?;
    let llm = OpenAiChatModel::from_config(&config.llm, api_key).context("creating chat model")?;
    let spec = OsiSpecProvider::from_config(&config.osi).context("creating spec provider")?;
    let repository = FsModelRepository::new(&config.output_dir);

    let agent = SemanticModelAgent::new(
        Arc::new(llm),
        Arc::new(catalog),
        Arc::new(repository.clone()),
    )
    .with_config(config.agent.clone())
    .with_spec_provider(spec)
    .with_progress(Arc::new(TracingProgressReporter));

    let run_id = request.run_id;
    let outcome = agent.run(request).await;
    Ok(RunSummary::new(&outcome, repository.record_path(run_id)))
}

/// Structurally validate a model file
///
/// # Errors
/// - the file cannot be read or is not a semantic model
pub fn validate(path: &Path) -> Result<ValidationReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading model {}", path.display()))?;
    let model = SemanticModel::from_json_str(&text)
        .with_context(|| format!("parsing model {}", path.display()))?;
    Ok(validate_structure(&model))
}

/// Printed result of `semgen spec`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecSummary {
    /// Where the text came from
    pub origin: String,
    /// Declared version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// When it was obtained
    pub fetched_at: String,
    /// When the cached copy stops being served (remote copies only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Text length in characters
    pub chars: usize,
    /// Full text, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Resolve the specification and describe it
pub async fn spec(provider: &OsiSpecProvider, refresh: bool, include_text: bool) -> SpecSummary {
    let spec = if refresh {
        provider.refresh().await
    } else {
        provider.spec().await
    };

    SpecSummary {
        origin: spec.origin.to_string(),
        version: spec.version(),
        fetched_at: spec.fetched_at.to_rfc3339(),
        expires_at: (!spec.is_bundled())
            .then(|| provider.cache().expires_at(spec.fetched_at).to_rfc3339()),
        chars: spec.text.chars().count(),
        text: include_text.then(|| spec.text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exit_codes_follow_status() {
        let summary = |status| RunSummary {
            run_id: Uuid::nil(),
            status,
            error: None,
            validation_attempts: 1,
            tokens_used: 0,
            warnings: Vec::new(),
            record: PathBuf::from("x.json"),
        };

        assert_eq!(summary(RunStatus::Completed).exit_code(), 0);
        assert_eq!(summary(RunStatus::CompletedWithErrors).exit_code(), 2);
        assert_eq!(summary(RunStatus::Failed).exit_code(), 1);
    }

    #[tokio::test]
    async fn offline_spec_summary() {
        let summary = spec(&OsiSpecProvider::offline(), false, false).await;

        assert_eq!(summary.origin, "bundled copy");
        assert_eq!(summary.version.as_deref(), Some("0.1"));
        assert_eq!(summary.expires_at, None);
        assert_eq!(summary.text, None);
        assert!(summary.chars > 0);
    }
}
