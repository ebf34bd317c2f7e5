//! Discover node: tool-calling loop over the schema catalog

use super::NodeContext;
use crate::llm::ChatMessage;
use crate::prompts;
use crate::state::{AgentState, StatePatch};
use futures::future::join_all;
use semgen_model::TokenUsage;

/// Let the model inspect the schema through discovery tools
///
/// The loop ends when the model answers without tool calls or the iteration
/// budget runs out. Without a usable summary from the model, a deterministic
/// schema digest is used instead. The tool exchanges are kept in the patch
/// messages ahead of the summary.
pub async fn discover(ctx: &NodeContext, state: &AgentState) -> StatePatch {
    let definitions = ctx.tools.definitions();
    let mut conversation = prompts::discovery_messages(state);
    let prompt_len = conversation.len();
    let mut usage = TokenUsage::default();
    let mut summary = None;
    let mut tool_calls = 0usize;

    for iteration in 1..=ctx.config.max_discovery_iterations {
        let response = match ctx.llm.invoke_with_tools(&conversation, &definitions).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(run_id = %state.run_id, iteration, error = %e, "schema discovery failed");
                return StatePatch {
                    messages: conversation.split_off(prompt_len),
                    ..StatePatch::new()
                }
                .with_usage(usage)
                .with_error(format!("Schema discovery failed: {e}"));
            }
        };
        usage += response.usage;

        if response.tool_calls.is_empty() {
            summary = Some(response.content);
            break;
        }

        conversation.push(ChatMessage::assistant_with_tool_calls(
            response.content,
            response.tool_calls.clone(),
        ));
        // Independent lookups; results keep the call order
        let results = join_all(response.tool_calls.iter().map(|call| {
            tracing::debug!(run_id = %state.run_id, tool = %call.name, "discovery tool call");
            ctx.tools.execute(call)
        }))
        .await;
        for (call, output) in response.tool_calls.iter().zip(results) {
            conversation.push(ChatMessage::tool(call.id.clone(), output));
        }
        tool_calls += response.tool_calls.len();
    }

    let summary = match summary.filter(|s| !s.trim().is_empty()) {
        Some(summary) => summary,
        None => {
            tracing::warn!(
                run_id = %state.run_id,
                budget = ctx.config.max_discovery_iterations,
                "no discovery summary from model, using schema digest"
            );
            ctx.tools.schema_digest(&state.tables).await
        }
    };

    tracing::info!(run_id = %state.run_id, tool_calls, "schema discovery complete");

    StatePatch {
        messages: conversation.split_off(prompt_len),
        discovery_summary: Some(summary.clone()),
        ..StatePatch::new()
    }
    .with_message(ChatMessage::assistant(summary))
    .with_usage(usage)
}
