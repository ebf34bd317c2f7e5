//! Validate node
//!
//! Two policies decide what happens to the candidate:
//!
//! - [`ValidationPolicy::StructuralGate`]: the structural validator decides.
//!   Fatal issues keep the unmodified candidate and annotate the run error so
//!   the work is persisted degraded rather than discarded. A valid model is
//!   replaced by its fixed copy and gets an advisory LLM quality review.
//! - [`ValidationPolicy::LlmGate`]: the LLM verdict decides. `INVALID` clears
//!   the candidate and hands the details to the next generate step.
//!
//! LLM failures never block either policy.

use super::NodeContext;
use crate::config::ValidationPolicy;
use crate::llm::ChatMessage;
use crate::prompts::{self, QUALITY_ISSUES, VERDICT_INVALID, VERDICT_VALID};
use crate::state::{AgentState, QualityReview, StatePatch};
use semgen_model::SemanticModel;

/// Validate the current candidate
///
/// Every call counts as one validation attempt, including calls without a
/// candidate (unparseable generate output).
pub async fn validate(ctx: &NodeContext, state: &AgentState) -> StatePatch {
    let attempt = state.validation_attempts + 1;
    let patch = StatePatch {
        validation_attempts: Some(attempt),
        ..StatePatch::new()
    };

    let Some(model) = &state.semantic_model else {
        tracing::warn!(run_id = %state.run_id, attempt, "no candidate model to validate");
        return patch;
    };

    match ctx.config.validation_policy {
        ValidationPolicy::StructuralGate => structural_gate(ctx, state, model, patch).await,
        ValidationPolicy::LlmGate => llm_gate(ctx, state, model, patch).await,
    }
}

async fn structural_gate(
    ctx: &NodeContext,
    state: &AgentState,
    model: &SemanticModel,
    mut patch: StatePatch,
) -> StatePatch {
    let report = ctx.validator.validate(model);

    for fix in &report.fixed_issues {
        tracing::debug!(run_id = %state.run_id, fix = %fix, "structural fix applied");
    }
    patch.warnings.extend(report.warnings.iter().cloned());

    if let Some(summary) = report.summary(ctx.config.max_error_issues) {
        tracing::warn!(
            run_id = %state.run_id,
            fatal = report.fatal_issues.len(),
            "{summary}"
        );
        // Keep the unmodified candidate; persist it with the error annotation
        patch.quality_review = Some(QualityReview::Skipped {
            reason: "structural validation failed".to_string(),
        });
        return patch.with_error(summary);
    }

    let fixed = report.fixed_model;
    tracing::info!(
        run_id = %state.run_id,
        fixes = report.fixed_issues.len(),
        warnings = report.warnings.len(),
        "semantic model passed structural validation"
    );

    let size = fixed.serialized_len();
    let review = if size < ctx.config.quality_review_max_chars {
        quality_review(ctx, state, &fixed, &mut patch).await
    } else {
        tracing::info!(
            run_id = %state.run_id,
            size,
            limit = ctx.config.quality_review_max_chars,
            "semantic model too large for quality review, skipping"
        );
        QualityReview::Skipped {
            reason: format!(
                "model is {size} characters, review limit is {}",
                ctx.config.quality_review_max_chars
            ),
        }
    };
    patch.quality_review = Some(review);

    patch.with_model(fixed).clear_feedback().clear_error()
}

/// Advisory review; never blocks
async fn quality_review(
    ctx: &NodeContext,
    state: &AgentState,
    model: &SemanticModel,
    patch: &mut StatePatch,
) -> QualityReview {
    let json = match model.to_json_pretty() {
        Ok(json) => json,
        Err(e) => return QualityReview::Failed(e.to_string()),
    };

    match ctx.llm.invoke(&prompts::quality_review_messages(&json)).await {
        Ok(response) => {
            patch.token_usage += response.usage;
            let verdict = response.content.trim().to_string();
            patch.messages.push(ChatMessage::assistant(response.content));

            if verdict.starts_with(QUALITY_ISSUES) {
                tracing::warn!(run_id = %state.run_id, "quality review reported issues: {verdict}");
                patch.warnings.push(format!("quality review: {verdict}"));
                QualityReview::IssuesFound(verdict)
            } else {
                tracing::debug!(run_id = %state.run_id, "quality review passed");
                QualityReview::Passed
            }
        }
        Err(e) => {
            tracing::warn!(run_id = %state.run_id, error = %e, "quality review failed, continuing");
            QualityReview::Failed(e.to_string())
        }
    }
}

async fn llm_gate(
    ctx: &NodeContext,
    state: &AgentState,
    model: &SemanticModel,
    mut patch: StatePatch,
) -> StatePatch {
    let json = match model.to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(run_id = %state.run_id, error = %e, "cannot serialize model for validation, keeping it");
            return patch;
        }
    };

    let spec = ctx.spec.spec().await;
    let messages = prompts::validation_messages(&json, &spec, ctx.config.spec_prompt_max_chars);

    let response = match ctx.llm.invoke(&messages).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(run_id = %state.run_id, error = %e, "LLM validation failed, keeping model");
            return patch;
        }
    };

    patch.token_usage += response.usage;
    let verdict = response.content.trim().to_string();
    patch.messages.push(ChatMessage::assistant(response.content));

    match parse_verdict(&verdict) {
        Verdict::Invalid(details) => {
            let details = if details.is_empty() {
                "the validator rejected the model without details"
            } else {
                details
            };
            tracing::warn!(run_id = %state.run_id, "LLM validation rejected model: {details}");
            patch.clear_model().with_feedback(details)
        }
        Verdict::Valid => {
            tracing::info!(run_id = %state.run_id, "LLM validation accepted model");
            patch.clear_feedback()
        }
        Verdict::Unclear => {
            tracing::warn!(run_id = %state.run_id, "unclear LLM validation verdict, keeping model");
            patch.with_warning(format!("unclear validation verdict: {verdict}"))
        }
    }
}

/// Outcome of an LLM gate reply
#[derive(Debug, PartialEq, Eq)]
enum Verdict<'a> {
    Valid,
    Invalid(&'a str),
    Unclear,
}

/// The leading word must be exactly `VALID` or `INVALID`
fn parse_verdict(reply: &str) -> Verdict<'_> {
    let reply = reply.trim();
    let end = reply
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(reply.len());
    let (word, rest) = reply.split_at(end);

    if word.eq_ignore_ascii_case(VERDICT_INVALID) {
        Verdict::Invalid(rest.trim_start().trim_start_matches([':', '.']).trim())
    } else if word.eq_ignore_ascii_case(VERDICT_VALID) {
        Verdict::Valid
    } else {
        Verdict::Unclear
    }
}
