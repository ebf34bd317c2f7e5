//! Plan node

use super::NodeContext;
use crate::llm::ChatMessage;
use crate::prompts;
use crate::state::{AgentState, StatePatch};

/// Ask the model for a discovery plan
///
/// A failed call yields a patch carrying the error.
pub async fn plan(ctx: &NodeContext, state: &AgentState) -> StatePatch {
    let messages = prompts::plan_messages(state);

    match ctx.llm.invoke(&messages).await {
        Ok(response) => {
            tracing::debug!(run_id = %state.run_id, chars = response.content.len(), "discovery plan ready");
            StatePatch {
                discovery_plan: Some(response.content.clone()),
                ..StatePatch::new()
            }
            .with_message(ChatMessage::assistant(response.content))
            .with_usage(response.usage)
        }
        Err(e) => {
            tracing::error!(run_id = %state.run_id, error = %e, "planning failed");
            StatePatch::new().with_error(format!("Discovery planning failed: {e}"))
        }
    }
}
