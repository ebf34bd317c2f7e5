//! Persist node

use super::NodeContext;
use crate::state::{AgentState, StatePatch};

const NO_MODEL: &str = "no semantic model was produced";

/// Store the candidate, or record the failure when there is none
///
/// A storage failure is reported in the patch; the run then ends failed.
pub async fn persist(ctx: &NodeContext, state: &AgentState) -> StatePatch {
    let result = match &state.semantic_model {
        Some(model) => {
            ctx.repository
                .save_model(state.run_id, model, state.error.as_deref())
                .await
        }
        None => {
            ctx.repository
                .mark_failed(state.run_id, state.error.as_deref().unwrap_or(NO_MODEL))
                .await
        }
    };

    match result {
        Ok(()) => StatePatch {
            persisted: Some(true),
            ..StatePatch::new()
        },
        Err(e) => {
            tracing::error!(run_id = %state.run_id, error = %e, "failed to persist semantic model");
            let error = match &state.error {
                Some(previous) => format!("{previous}; failed to persist semantic model: {e}"),
                None => format!("Failed to persist semantic model: {e}"),
            };
            StatePatch {
                persisted: Some(false),
                ..StatePatch::new()
            }
            .with_error(error)
        }
    }
}
