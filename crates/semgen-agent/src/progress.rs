//! Run progress reporting
//!
//! Progress goes to an external collaborator. Reporting is best-effort: a
//! failing reporter is logged and never fails the run.

use crate::error::ProgressError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Pipeline steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Discovery planning
    Plan,
    /// Schema discovery
    Discover,
    /// Model generation
    Generate,
    /// Model validation
    Validate,
    /// Persistence
    Persist,
}

impl PipelineStep {
    /// All steps in order
    pub const ALL: [Self; 5] = [
        Self::Plan,
        Self::Discover,
        Self::Generate,
        Self::Validate,
        Self::Persist,
    ];

    /// Machine key
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Discover => "discover",
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::Persist => "persist",
        }
    }

    /// Human label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Plan => "Planning discovery",
            Self::Discover => "Discovering schema",
            Self::Generate => "Generating semantic model",
            Self::Validate => "Validating semantic model",
            Self::Persist => "Saving semantic model",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Status of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not started
    Pending,
    /// In progress
    Running,
    /// Done
    Completed,
    /// Ended the run
    Failed,
}

/// One entry of the step list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Machine key
    pub key: String,
    /// Human label
    pub label: String,
    /// Status
    pub status: StepStatus,
}

/// Progress snapshot sent to the reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProgress {
    /// Key of the current step
    pub current_step: String,
    /// Label of the current step
    pub current_step_label: String,
    /// 0..=100
    pub percent_complete: u8,
    /// Cumulative tokens
    pub tokens_used: u64,
    /// All steps with status
    pub steps: Vec<StepProgress>,
}

impl RunProgress {
    /// Snapshot with `step` running and earlier steps completed
    #[must_use]
    pub fn at(step: PipelineStep, tokens_used: u64) -> Self {
        let current = step.index();
        Self::build(step, tokens_used, percent(current), |index| {
            match index.cmp(&current) {
                std::cmp::Ordering::Less => StepStatus::Completed,
                std::cmp::Ordering::Equal => StepStatus::Running,
                std::cmp::Ordering::Greater => StepStatus::Pending,
            }
        })
    }

    /// Final snapshot; a failed run marks `step` failed
    #[must_use]
    pub fn finished(step: PipelineStep, tokens_used: u64, failed: bool) -> Self {
        let current = step.index();
        Self::build(step, tokens_used, 100, |index| {
            if failed && index == current {
                StepStatus::Failed
            } else if index <= current {
                StepStatus::Completed
            } else {
                StepStatus::Pending
            }
        })
    }

    fn build(
        step: PipelineStep,
        tokens_used: u64,
        percent_complete: u8,
        status: impl Fn(usize) -> StepStatus,
    ) -> Self {
        Self {
            current_step: step.key().to_string(),
            current_step_label: step.label().to_string(),
            percent_complete,
            tokens_used,
            steps: PipelineStep::ALL
                .iter()
                .enumerate()
                .map(|(index, s)| StepProgress {
                    key: s.key().to_string(),
                    label: s.label().to_string(),
                    status: status(index),
                })
                .collect(),
        }
    }
}

fn percent(completed_steps: usize) -> u8 {
    let total = PipelineStep::ALL.len();
    u8::try_from(completed_steps.min(total) * 100 / total).unwrap_or(100)
}

/// Receives run progress updates
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Record progress for a run
    async fn update_run_progress(
        &self,
        run_id: Uuid,
        progress: RunProgress,
    ) -> Result<(), ProgressError>;
}

/// Send an update, logging and discarding any failure
///
/// An update still pending after `timeout` is dropped.
pub async fn report_progress_best_effort(
    reporter: &dyn ProgressReporter,
    run_id: Uuid,
    progress: RunProgress,
    timeout: Duration,
) {
    let step = progress.current_step.clone();
    match tokio::time::timeout(timeout, reporter.update_run_progress(run_id, progress)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(%run_id, step, error = %e, "progress update failed, continuing");
        }
        Err(_) => {
            tracing::warn!(
                %run_id,
                step,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "progress update timed out, continuing"
            );
        }
    }
}

/// Reporter writing progress to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressReporter;

#[async_trait]
impl ProgressReporter for TracingProgressReporter {
    async fn update_run_progress(
        &self,
        run_id: Uuid,
        progress: RunProgress,
    ) -> Result<(), ProgressError> {
        tracing::info!(
            %run_id,
            step = %progress.current_step,
            percent = progress.percent_complete,
            tokens = progress.tokens_used,
            "{}",
            progress.current_step_label
        );
        Ok(())
    }
}

/// Reporter discarding every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressReporter;

#[async_trait]
impl ProgressReporter for NoopProgressReporter {
    async fn update_run_progress(
        &self,
        _run_id: Uuid,
        _progress: RunProgress,
    ) -> Result<(), ProgressError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_marks_earlier_steps_completed() {
        let progress = RunProgress::at(PipelineStep::Generate, 42);

        assert_eq!(progress.current_step, "generate");
        assert_eq!(progress.percent_complete, 40);
        assert_eq!(progress.tokens_used, 42);
        let statuses: Vec<_> = progress.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Completed,
                StepStatus::Completed,
                StepStatus::Running,
                StepStatus::Pending,
                StepStatus::Pending,
            ]
        );
    }

    #[test]
    fn finished_failed_marks_step() {
        let progress = RunProgress::finished(PipelineStep::Validate, 0, true);
        assert_eq!(progress.percent_complete, 100);
        assert_eq!(progress.steps[3].status, StepStatus::Failed);
        assert_eq!(progress.steps[4].status, StepStatus::Pending);
    }

    #[test]
    fn progress_serializes_camel_case() {
        let json = serde_json::to_value(RunProgress::at(PipelineStep::Plan, 0)).unwrap();
        assert_eq!(json["currentStepLabel"], "Planning discovery");
        assert_eq!(json["percentComplete"], 0);
        assert_eq!(json["steps"][0]["status"], "running");
    }

    #[tokio::test]
    async fn best_effort_swallows_failures() {
        let mut reporter = MockProgressReporter::new();
        reporter
            .expect_update_run_progress()
            .times(1)
            .returning(|_, _| Err(ProgressError::Unavailable("down".into())));

        report_progress_best_effort(
            &reporter,
            Uuid::new_v4(),
            RunProgress::at(PipelineStep::Plan, 0),
            Duration::from_secs(1),
        )
        .await;
    }

    #[tokio::test]
    async fn best_effort_forwards_snapshot() {
        let run_id = Uuid::new_v4();
        let mut reporter = MockProgressReporter::new();
        reporter
            .expect_update_run_progress()
            .withf(move |id, progress| *id == run_id && progress.current_step == "persist")
            .times(1)
            .returning(|_, _| Ok(()));

        report_progress_best_effort(
            &reporter,
            run_id,
            RunProgress::at(PipelineStep::Persist, 7),
            Duration::from_secs(1),
        )
        .await;
    }

    struct StalledReporter;

    #[async_trait]
    impl ProgressReporter for StalledReporter {
        async fn update_run_progress(
            &self,
            _run_id: Uuid,
            _progress: RunProgress,
        ) -> Result<(), ProgressError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn best_effort_abandons_stalled_reporter() {
        let report = report_progress_best_effort(
            &StalledReporter,
            Uuid::new_v4(),
            RunProgress::at(PipelineStep::Plan, 0),
            Duration::from_millis(20),
        );

        tokio::time::timeout(Duration::from_secs(5), report)
            .await
            .unwrap();
    }
}
