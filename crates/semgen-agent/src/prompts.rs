//! Prompt construction for each pipeline step

use crate::llm::ChatMessage;
use crate::state::AgentState;
use semgen_osi::OsiSpec;

/// Prefix of a quality review that found problems
pub const QUALITY_ISSUES: &str = "QUALITY_ISSUES";
/// Prefix of a clean quality review
pub const QUALITY_OK: &str = "QUALITY_OK";
/// LLM-gate acceptance verdict
pub const VERDICT_VALID: &str = "VALID";
/// LLM-gate rejection verdict prefix
pub const VERDICT_INVALID: &str = "INVALID";

const SYSTEM: &str = "You are a data modeling expert. You build semantic models that \
follow the Open Semantic Interchange (OSI) specification from relational database schemas.";

fn table_list(state: &AgentState) -> String {
    if state.tables.is_empty() {
        "(all tables in the database)".to_string()
    } else {
        state.tables.join(", ")
    }
}

fn instructions(state: &AgentState) -> String {
    state
        .instructions
        .as_deref()
        .map(|text| format!("\n\nAdditional instructions from the user:\n{text}"))
        .unwrap_or_default()
}

/// Plan step conversation
#[must_use]
pub fn plan_messages(state: &AgentState) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM),
        ChatMessage::user(format!(
            "We will build a semantic model for these tables: {}.\n\n\
             Write a short discovery plan: which tables to inspect, which columns \
             are likely keys, measures and time dimensions, and which relationships \
             to confirm. Answer in plain text.{}",
            table_list(state),
            instructions(state)
        )),
    ]
}

/// Discover step opening conversation
#[must_use]
pub fn discovery_messages(state: &AgentState) -> Vec<ChatMessage> {
    let plan = state.discovery_plan.as_deref().unwrap_or("(no plan)");
    vec![
        ChatMessage::system(SYSTEM),
        ChatMessage::user(format!(
            "Tables in scope: {}.\n\nDiscovery plan:\n{plan}\n\n\
             Use the list_tables, describe_table and sample_rows tools to inspect \
             the schema. When you are done, reply without tool calls with a concise \
             summary of every table: columns and types, primary keys, foreign keys, \
             likely measures and time columns.",
            table_list(state)
        )),
    ]
}

/// Generate step conversation
///
/// On a retry the previous validation feedback is appended so the model can
/// fix the reported issues.
#[must_use]
pub fn generation_messages(
    state: &AgentState,
    spec: &OsiSpec,
    spec_max_chars: usize,
) -> Vec<ChatMessage> {
    let plan = state.discovery_plan.as_deref().unwrap_or("(no plan)");
    let summary = state
        .discovery_summary
        .as_deref()
        .unwrap_or("(no discovery summary)");

    let mut prompt = format!(
        "Create an OSI semantic model for these tables: {}.\n\n\
         Discovery plan:\n{plan}\n\n\
         Schema findings:\n{summary}\n\n\
         OSI specification (version {}):\n{}\n\n\
         Requirements:\n\
         - Every dataset needs a name, a source and at least one field.\n\
         - Every field and metric needs an expression with at least one \
           dialect/expression pair (use ANSI_SQL unless another dialect is required).\n\
         - Relationships must reference datasets defined in the model and list \
           the same number of from_columns and to_columns.\n\
         - Add ai_context with synonyms to the model, datasets and fields.\n\n\
         Respond with only the JSON object of the semantic model, no commentary.{}",
        table_list(state),
        spec.version().as_deref().unwrap_or("unknown"),
        spec.excerpt(spec_max_chars),
        instructions(state)
    );

    if let Some(feedback) = &state.validation_feedback {
        prompt.push_str(&format!(
            "\n\nThe previous attempt was rejected. Fix these issues:\n{feedback}"
        ));
    }

    vec![ChatMessage::system(SYSTEM), ChatMessage::user(prompt)]
}

/// Advisory quality review conversation
#[must_use]
pub fn quality_review_messages(model_json: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM),
        ChatMessage::user(format!(
            "Review this semantic model for semantic quality: misleading names, \
             missing measures, wrong relationship directions, weak synonyms.\n\n\
             {model_json}\n\n\
             Start your answer with {QUALITY_OK} if it is acceptable, or with \
             {QUALITY_ISSUES} followed by a list of the problems."
        )),
    ]
}

/// LLM-gate validation conversation
#[must_use]
pub fn validation_messages(model_json: &str, spec: &OsiSpec, spec_max_chars: usize) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM),
        ChatMessage::user(format!(
            "Validate this semantic model against the OSI specification.\n\n\
             Specification:\n{}\n\nModel:\n{model_json}\n\n\
             Answer {VERDICT_VALID} if the model conforms, otherwise \
             {VERDICT_INVALID}: followed by the details of every problem.",
            spec.excerpt(spec_max_chars)
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RunRequest;

    fn state() -> AgentState {
        AgentState::new(RunRequest::new().with_tables(["orders", "customers"]))
    }

    #[test]
    fn plan_lists_tables() {
        let messages = plan_messages(&state());
        assert!(messages[1].content.contains("orders, customers"));

        let all = plan_messages(&AgentState::new(RunRequest::new()));
        assert!(all[1].content.contains("all tables"));
    }

    #[test]
    fn generation_appends_feedback_on_retry() {
        let spec = OsiSpec::bundled();
        let mut state = state();

        let first = generation_messages(&state, &spec, 1_000);
        assert!(!first[1].content.contains("Fix these issues"));

        state.validation_feedback = Some("dataset 'orders' has no fields".into());
        let retry = generation_messages(&state, &spec, 1_000);
        assert!(retry[1]
            .content
            .contains("Fix these issues:\ndataset 'orders' has no fields"));
    }

    #[test]
    fn generation_truncates_spec() {
        let spec = OsiSpec::remote("x".repeat(500), "http://spec.test");
        let messages = generation_messages(&state(), &spec, 100);
        assert!(!messages[1].content.contains(&"x".repeat(101)));
    }

    #[test]
    fn review_prompt_names_verdicts() {
        let messages = quality_review_messages("{}");
        assert!(messages[1].content.contains(QUALITY_OK));
        assert!(messages[1].content.contains(QUALITY_ISSUES));
    }

    #[test]
    fn instructions_are_included() {
        let state = AgentState::new(RunRequest::new().with_instructions("use snake_case"));
        assert!(plan_messages(&state)[1].content.contains("use snake_case"));
    }
}
