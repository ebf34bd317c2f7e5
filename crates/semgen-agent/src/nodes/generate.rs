//! Generate node

use super::NodeContext;
use crate::error::LlmError;
use crate::llm::{extract_json, ChatMessage};
use crate::prompts;
use crate::state::{AgentState, StatePatch};
use semgen_model::SemanticModel;

/// Produce a candidate semantic model with exactly one LLM call
///
/// The raw response is appended to the conversation and its usage recorded.
/// Output that does not parse as a model clears the candidate and leaves the
/// parse error as feedback for the next attempt.
///
/// # Errors
/// - `LlmError` when the call itself fails; the graph decides whether to retry
pub async fn generate(ctx: &NodeContext, state: &AgentState) -> Result<StatePatch, LlmError> {
    let spec = ctx.spec.spec().await;
    let messages = prompts::generation_messages(state, &spec, ctx.config.spec_prompt_max_chars);

    tracing::debug!(
        run_id = %state.run_id,
        spec = %spec.origin,
        retry_feedback = state.validation_feedback.is_some(),
        "generating semantic model"
    );

    let response = ctx.llm.invoke(&messages).await?;

    let parsed = SemanticModel::from_json_str(extract_json(&response.content));
    let patch = StatePatch::new()
        .with_message(ChatMessage::assistant(response.content))
        .with_usage(response.usage);

    Ok(match parsed {
        Ok(model) => {
            tracing::info!(
                run_id = %state.run_id,
                datasets = model.datasets.len(),
                relationships = model.relationships.len(),
                metrics = model.metrics.len(),
                "generated candidate semantic model"
            );
            patch.with_model(model).clear_feedback().clear_error()
        }
        Err(e) => {
            tracing::warn!(run_id = %state.run_id, error = %e, "model output is not a semantic model");
            patch.clear_model().with_feedback(format!(
                "The response was not a valid semantic model JSON object ({e}). \
                 Respond with only the JSON object."
            ))
        }
    })
}
