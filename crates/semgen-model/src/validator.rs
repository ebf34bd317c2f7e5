//! Structural validation of semantic models
//!
//! Deterministic, network-free rule checking against the OSI structure.
//! Issues are classified as:
//! - **fatal**: the model cannot be used as-is (missing names, sources,
//!   expressions, dangling or mismatched relationships)
//! - **warning**: quality problems that never block (unknown dialects,
//!   missing synonyms)
//! - **fixed**: additive repairs applied to the returned copy
//!
//! Only additive repairs are made (empty `ai_context` placeholders).
//! Anything that would need judgment, such as guessing join columns, is
//! reported as fatal instead.

use crate::dialect::Dialect;
use crate::types::{AiContext, Dataset, Expression, Field, SemanticModel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of a structural validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Input with additive fixes applied
    pub fixed_model: SemanticModel,
    /// True when there are no fatal issues
    pub is_valid: bool,
    /// Issues that make the model unusable
    pub fatal_issues: Vec<String>,
    /// Non-blocking quality issues
    pub warnings: Vec<String>,
    /// Repairs applied to `fixed_model`
    pub fixed_issues: Vec<String>,
}

impl ValidationReport {
    /// Summary of the first `limit` fatal issues, `None` when valid
    #[must_use]
    pub fn summary(&self, limit: usize) -> Option<String> {
        if self.fatal_issues.is_empty() {
            return None;
        }

        let shown: Vec<&str> = self
            .fatal_issues
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect();
        let hidden = self.fatal_issues.len().saturating_sub(shown.len());

        let mut summary = format!(
            "Semantic model failed structural validation with {} fatal issue(s): {}",
            self.fatal_issues.len(),
            shown.join("; ")
        );
        if hidden > 0 {
            summary.push_str(&format!(" (and {hidden} more)"));
        }
        Some(summary)
    }
}

/// Structural validator for OSI semantic models
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a model and return the repaired copy with all findings
    ///
    /// Pure and idempotent: validating `fixed_model` again yields no new
    /// fixes and the same verdict.
    #[must_use]
    pub fn validate(&self, model: &SemanticModel) -> ValidationReport {
        let mut findings = Findings::default();

        Self::check_model_shape(model, &mut findings);
        for (index, dataset) in model.datasets.iter().enumerate() {
            Self::check_dataset(index, dataset, &mut findings);
        }
        Self::check_relationships(model, &mut findings);
        Self::check_metrics(model, &mut findings);

        let mut fixed_model = model.clone();
        Self::fill_ai_context(&mut fixed_model, &mut findings);

        ValidationReport {
            fixed_model,
            is_valid: findings.fatal.is_empty(),
            fatal_issues: findings.fatal,
            warnings: findings.warnings,
            fixed_issues: findings.fixed,
        }
    }

    /// Model has a name and at least one dataset
    fn check_model_shape(model: &SemanticModel, findings: &mut Findings) {
        if is_blank(model.name.as_deref()) {
            findings.fatal("semantic model is missing a name".to_string());
        }
        if model.datasets.is_empty() {
            findings.fatal("semantic model has no datasets".to_string());
        }
    }

    /// Dataset has a name, a source and fields; each field is checked
    fn check_dataset(index: usize, dataset: &Dataset, findings: &mut Findings) {
        let label = dataset_label(index, dataset);

        if is_blank(dataset.name.as_deref()) {
            findings.fatal(format!("{label} is missing a name"));
        }
        if is_blank(dataset.source.as_deref()) {
            findings.fatal(format!("{label} is missing a source"));
        }
        if dataset.fields.is_empty() {
            findings.fatal(format!("{label} has no fields"));
        }

        for (field_index, field) in dataset.fields.iter().enumerate() {
            let field_label = field_label(&label, field_index, field);
            if is_blank(field.name.as_deref()) {
                findings.fatal(format!("{field_label} is missing a name"));
            }
            Self::check_expression(&field_label, field.expression.as_ref(), findings);
        }
    }

    /// At least one dialect expression, non-blank, in a known dialect
    fn check_expression(label: &str, expression: Option<&Expression>, findings: &mut Findings) {
        let dialects = expression.map_or(&[][..], |e| e.dialects.as_slice());

        if dialects.is_empty() {
            findings.fatal(format!(
                "{label} has no expression (at least one dialect/expression pair is required)"
            ));
            return;
        }

        for entry in dialects {
            let Some(dialect) = &entry.dialect else {
                findings.fatal(format!("{label} has an expression without a dialect"));
                continue;
            };
            if entry.expression.trim().is_empty() {
                findings.fatal(format!(
                    "{label} has an empty expression for dialect {dialect}"
                ));
            }
            if let Dialect::Other(name) = dialect {
                findings.warn(format!(
                    "{label} uses unknown dialect '{name}' (expected one of {})",
                    Dialect::known_names()
                ));
            }
        }
    }

    /// Relationship endpoints resolve and column lists pair up
    fn check_relationships(model: &SemanticModel, findings: &mut Findings) {
        let datasets: HashSet<&str> = model
            .dataset_names()
            .filter(|name| !name.trim().is_empty())
            .collect();

        for (index, rel) in model.relationships.iter().enumerate() {
            let label = match rel.name.as_deref() {
                Some(name) if !name.trim().is_empty() => format!("relationship '{name}'"),
                _ => format!("relationship #{}", index + 1),
            };

            for (side, target) in [("from", rel.from.as_deref()), ("to", rel.to.as_deref())] {
                match target {
                    Some(name) if !name.trim().is_empty() => {
                        if !datasets.contains(name) {
                            findings.fatal(format!(
                                "{label} references unknown dataset '{name}' in '{side}'"
                            ));
                        }
                    }
                    _ => findings.fatal(format!("{label} is missing its '{side}' dataset")),
                }
            }

            if rel.from_columns.is_empty() || rel.to_columns.is_empty() {
                findings.fatal(format!(
                    "{label} must list join columns in both from_columns and to_columns"
                ));
            } else if rel.from_columns.len() != rel.to_columns.len() {
                findings.fatal(format!(
                    "{label} has mismatched column lists: from_columns has {}, to_columns has {}",
                    rel.from_columns.len(),
                    rel.to_columns.len()
                ));
            }
        }
    }

    /// Metric has a name and an expression
    fn check_metrics(model: &SemanticModel, findings: &mut Findings) {
        for (index, metric) in model.metrics.iter().enumerate() {
            let label = match metric.name.as_deref() {
                Some(name) if !name.trim().is_empty() => format!("metric '{name}'"),
                _ => {
                    let label = format!("metric #{}", index + 1);
                    findings.fatal(format!("{label} is missing a name"));
                    label
                }
            };
            Self::check_expression(&label, metric.expression.as_ref(), findings);
        }
    }

    /// Insert empty `ai_context` placeholders at model, dataset and field level
    fn fill_ai_context(model: &mut SemanticModel, findings: &mut Findings) {
        fill_slot(&mut model.ai_context, "semantic model", findings);

        for (index, dataset) in model.datasets.iter_mut().enumerate() {
            let label = dataset_label(index, dataset);
            fill_slot(&mut dataset.ai_context, &label, findings);

            for (field_index, field) in dataset.fields.iter_mut().enumerate() {
                let field_label = field_label(&label, field_index, field);
                fill_slot(&mut field.ai_context, &field_label, findings);
            }
        }
    }
}

/// Validate a model with the default validator
#[inline]
#[must_use]
pub fn validate_structure(model: &SemanticModel) -> ValidationReport {
    StructuralValidator::new().validate(model)
}

#[derive(Debug, Default)]
struct Findings {
    fatal: Vec<String>,
    warnings: Vec<String>,
    fixed: Vec<String>,
}

impl Findings {
    fn fatal(&mut self, issue: String) {
        self.fatal.push(issue);
    }

    fn warn(&mut self, issue: String) {
        self.warnings.push(issue);
    }

    fn fixed(&mut self, issue: String) {
        self.fixed.push(issue);
    }
}

fn fill_slot(slot: &mut Option<AiContext>, label: &str, findings: &mut Findings) {
    let context = slot.get_or_insert_with(|| {
        findings.fixed(format!("added empty ai_context placeholder to {label}"));
        AiContext::placeholder()
    });

    if context.synonyms().is_empty() {
        findings.warn(format!("{label} has no ai_context synonyms"));
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

fn dataset_label(index: usize, dataset: &Dataset) -> String {
    match dataset.name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("dataset '{name}'"),
        _ => format!("dataset #{}", index + 1),
    }
}

fn field_label(dataset_label: &str, index: usize, field: &Field) -> String {
    match field.name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("field '{name}' of {dataset_label}"),
        _ => format!("field #{} of {dataset_label}", index + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DialectExpression, Metric, Relationship};
    use pretty_assertions::assert_eq;

    fn annotated(field: Field, synonyms: &[&str]) -> Field {
        field.with_ai_context(AiContext::with_synonyms(synonyms))
    }

    fn well_formed() -> SemanticModel {
        let mut model = SemanticModel::new("sales")
            .with_dataset(
                Dataset::new("orders", "public.orders")
                    .with_primary_key(&["id"])
                    .with_ai_context(AiContext::with_synonyms(&["purchases"]))
                    .with_field(annotated(Field::column("id"), &["order id"]))
                    .with_field(annotated(Field::column("customer_id"), &["buyer"]))
                    .with_field(annotated(
                        Field::new(
                            "amount",
                            Expression::ansi("amount").with(Dialect::Snowflake, "AMOUNT"),
                        ),
                        &["total", "value"],
                    )),
            )
            .with_dataset(
                Dataset::new("customers", "public.customers")
                    .with_ai_context(AiContext::with_synonyms(&["clients"]))
                    .with_field(annotated(Field::column("id"), &["customer id"])),
            )
            .with_relationship(Relationship::new(
                "orders_customers",
                "orders",
                "customers",
                &["customer_id"],
                &["id"],
            ))
            .with_metric(Metric::new("revenue", Expression::ansi("SUM(orders.amount)")));
        model.ai_context = Some(AiContext::with_synonyms(&["sales model"]));
        model
    }

    #[test]
    fn well_formed_model_is_valid() {
        let report = validate_structure(&well_formed());

        assert!(report.is_valid);
        assert!(report.fatal_issues.is_empty());
        assert!(report.fixed_issues.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.fixed_model, well_formed());
    }

    #[test]
    fn missing_model_name_and_datasets_are_fatal() {
        let report = validate_structure(&SemanticModel::default());

        assert!(!report.is_valid);
        assert_eq!(
            report.fatal_issues,
            vec![
                "semantic model is missing a name".to_string(),
                "semantic model has no datasets".to_string(),
            ]
        );
    }

    #[test]
    fn missing_dataset_name_is_fatal() {
        let mut model = well_formed();
        model.datasets[1].name = None;

        let report = validate_structure(&model);
        assert!(!report.is_valid);
        assert!(report
            .fatal_issues
            .contains(&"dataset #2 is missing a name".to_string()));
        // The relationship now points at a dataset that no longer exists
        assert!(report
            .fatal_issues
            .iter()
            .any(|i| i.contains("unknown dataset 'customers'")));
    }

    #[test]
    fn dataset_without_source_or_fields_is_fatal() {
        let mut model = well_formed();
        model.datasets[0].source = Some("  ".to_string());
        model.datasets[1].fields.clear();

        let report = validate_structure(&model);
        assert!(report
            .fatal_issues
            .contains(&"dataset 'orders' is missing a source".to_string()));
        assert!(report
            .fatal_issues
            .contains(&"dataset 'customers' has no fields".to_string()));
    }

    #[test]
    fn field_without_expression_is_fatal() {
        let mut model = well_formed();
        model.datasets[0].fields[0].expression = None;
        model.datasets[0].fields[1].expression = Some(Expression::default());

        let report = validate_structure(&model);
        assert!(!report.is_valid);
        assert_eq!(
            report
                .fatal_issues
                .iter()
                .filter(|i| i.contains("has no expression"))
                .count(),
            2
        );
    }

    #[test]
    fn blank_expression_text_is_fatal() {
        let mut model = well_formed();
        model.datasets[0].fields[2].expression = Some(Expression {
            dialects: vec![DialectExpression {
                dialect: Some(Dialect::AnsiSql),
                expression: "   ".to_string(),
            }],
        });

        let report = validate_structure(&model);
        assert_eq!(
            report.fatal_issues,
            vec!["field 'amount' of dataset 'orders' has an empty expression for dialect ANSI_SQL"
                .to_string()]
        );
    }

    #[test]
    fn expression_without_dialect_is_fatal() {
        let mut model = well_formed();
        model.datasets[0].fields[2].expression =
            Some(serde_json::from_str(r#"{"dialects": [{"expression": "f"}]}"#).unwrap());

        let report = validate_structure(&model);

        assert!(!report.is_valid);
        assert_eq!(
            report.fatal_issues,
            vec!["field 'amount' of dataset 'orders' has an expression without a dialect"
                .to_string()]
        );
        // nothing guessed on the fixed copy
        let fixed = report.fixed_model.datasets[0].fields[2].expression.as_ref().unwrap();
        assert_eq!(fixed.dialects[0].dialect, None);
    }

    #[test]
    fn unknown_dialect_is_warning_only() {
        let mut model = well_formed();
        model.datasets[0].fields[0].expression =
            Some(Expression::single(Dialect::Other("POSTGRES".to_string()), "id"));

        let report = validate_structure(&model);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("unknown dialect 'POSTGRES'"));
    }

    #[test]
    fn unequal_relationship_columns_are_fatal() {
        let mut model = well_formed();
        model.relationships = vec![Relationship {
            name: None,
            from: Some("orders".to_string()),
            to: Some("customers".to_string()),
            from_columns: vec!["a".to_string(), "b".to_string()],
            to_columns: vec!["x".to_string()],
            ai_context: None,
        }];

        let report = validate_structure(&model);
        assert!(!report.is_valid);
        assert_eq!(
            report.fatal_issues,
            vec!["relationship #1 has mismatched column lists: from_columns has 2, to_columns has 1"
                .to_string()]
        );
    }

    #[test]
    fn dangling_relationship_is_fatal_and_never_guessed() {
        let mut model = well_formed();
        model.relationships.push(Relationship {
            name: Some("orders_products".to_string()),
            from: Some("orders".to_string()),
            to: Some("products".to_string()),
            ..Relationship::default()
        });

        let report = validate_structure(&model);
        assert!(report
            .fatal_issues
            .contains(&"relationship 'orders_products' references unknown dataset 'products' in 'to'".to_string()));
        assert!(report
            .fatal_issues
            .iter()
            .any(|i| i.contains("'orders_products' must list join columns")));
        // Columns are left empty in the fixed model
        assert!(report.fixed_model.relationships[1].from_columns.is_empty());
    }

    #[test]
    fn relationship_missing_endpoint_is_fatal() {
        let mut model = well_formed();
        model.relationships[0].from = None;

        let report = validate_structure(&model);
        assert_eq!(
            report.fatal_issues,
            vec!["relationship 'orders_customers' is missing its 'from' dataset".to_string()]
        );
    }

    #[test]
    fn metric_without_name_or_expression_is_fatal() {
        let mut model = well_formed();
        model.metrics.push(Metric::default());

        let report = validate_structure(&model);
        assert_eq!(
            report.fatal_issues,
            vec![
                "metric #2 is missing a name".to_string(),
                "metric #2 has no expression (at least one dialect/expression pair is required)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn missing_ai_context_is_filled_and_warned() {
        let mut model = well_formed();
        model.ai_context = None;
        model.datasets[1].fields[0].ai_context = None;

        let report = validate_structure(&model);
        assert!(report.is_valid);
        assert_eq!(
            report.fixed_issues,
            vec![
                "added empty ai_context placeholder to semantic model".to_string(),
                "added empty ai_context placeholder to field 'id' of dataset 'customers'"
                    .to_string(),
            ]
        );
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.fixed_model.ai_context, Some(AiContext::placeholder()));
        // Input untouched
        assert!(model.ai_context.is_none());
    }

    #[test]
    fn second_pass_is_a_fixed_point() {
        let mut model = well_formed();
        model.ai_context = None;
        model.datasets[0].ai_context = None;
        model.relationships[0].to_columns.push("extra".to_string());

        let first = validate_structure(&model);
        let second = validate_structure(&first.fixed_model);

        assert!(!first.fixed_issues.is_empty());
        assert!(second.fixed_issues.is_empty());
        assert_eq!(first.is_valid, second.is_valid);
        assert_eq!(first.fatal_issues, second.fatal_issues);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(second.fixed_model, first.fixed_model);
    }

    #[test]
    fn summary_caps_listed_issues() {
        let report = validate_structure(&SemanticModel {
            datasets: vec![Dataset::default(), Dataset::default()],
            ..SemanticModel::default()
        });
        assert_eq!(report.fatal_issues.len(), 7);

        let summary = report.summary(3).unwrap();
        assert!(summary.starts_with(
            "Semantic model failed structural validation with 7 fatal issue(s): "
        ));
        assert!(summary.contains("semantic model is missing a name; dataset #1 is missing a name; dataset #1 is missing a source"));
        assert!(summary.ends_with("(and 4 more)"));

        assert!(validate_structure(&well_formed()).summary(3).is_none());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = validate_structure(&well_formed());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isValid"], serde_json::Value::Bool(true));
        assert!(json.get("fatalIssues").is_some());
        assert!(json.get("fixedIssues").is_some());
        assert!(json.get("fixedModel").is_some());
    }
}
