//! OSI semantic model types
//!
//! Every collection defaults to empty and every name is optional: model JSON
//! comes from an LLM and may be partially malformed. Deciding whether a
//! missing piece is acceptable is the validator's job, not the decoder's.

use crate::dialect::Dialect;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys under which models are sometimes wrapped by the generator
const WRAPPER_KEYS: [&str; 2] = ["semantic_model", "semanticModel"];

/// Root of an OSI semantic model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticModel {
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model level annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<AiContext>,
    /// Logical datasets (one per table or view)
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    /// Joins between datasets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    /// Model level aggregations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,
    /// Vendor extensions, carried through untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_extensions: Vec<Value>,
}

impl SemanticModel {
    /// Create an empty model with a name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// With dataset
    #[inline]
    #[must_use]
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.push(dataset);
        self
    }

    /// With relationship
    #[inline]
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// With metric
    #[inline]
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Decode a model from JSON text
    ///
    /// Accepts either the bare model object or one wrapped under a
    /// `semantic_model` key (object or single-element array).
    pub fn from_json_str(input: &str) -> Result<Self, ModelError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Decode a model from a JSON value
    pub fn from_json_value(value: Value) -> Result<Self, ModelError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Err(ModelError::NotAnObject(json_kind(&other))),
        };

        for key in WRAPPER_KEYS {
            if let Some(inner) = map.remove(key) {
                let inner = match inner {
                    Value::Array(items) => items
                        .into_iter()
                        .next()
                        .ok_or(ModelError::EmptyWrapper(key))?,
                    other => other,
                };
                return Self::from_json_value(inner);
            }
        }

        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Encode as compact JSON
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Length in characters of the compact JSON encoding
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map_or(0, |s| s.chars().count())
    }

    /// Find a dataset by name
    #[must_use]
    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets
            .iter()
            .find(|d| d.name.as_deref() == Some(name))
    }

    /// Names of all named datasets
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().filter_map(|d| d.name.as_deref())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A logical dataset backed by a physical source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Physical source (`schema.table` or query)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Primary key columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dataset annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<AiContext>,
    /// Fields exposed by the dataset
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Dataset {
    /// Create dataset with name and source
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// With field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// With primary key
    #[inline]
    #[must_use]
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// With annotations
    #[inline]
    #[must_use]
    pub fn with_ai_context(mut self, ai_context: AiContext) -> Self {
        self.ai_context = Some(ai_context);
        self
    }
}

/// A column or derived attribute of a dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Dialect-tagged expressions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Dimension metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
    /// Field annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<AiContext>,
}

impl Field {
    /// Field whose ANSI SQL expression is the column of the same name
    #[inline]
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            expression: Some(Expression::ansi(name.clone())),
            name: Some(name),
            ..Self::default()
        }
    }

    /// Field with an explicit expression
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, expression: Expression) -> Self {
        Self {
            name: Some(name.into()),
            expression: Some(expression),
            ..Self::default()
        }
    }

    /// Mark as time dimension
    #[inline]
    #[must_use]
    pub fn time_dimension(mut self) -> Self {
        self.dimension = Some(Dimension { is_time: true });
        self
    }

    /// With annotations
    #[inline]
    #[must_use]
    pub fn with_ai_context(mut self, ai_context: AiContext) -> Self {
        self.ai_context = Some(ai_context);
        self
    }
}

/// Dimension metadata for a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Whether the dimension is a time axis
    #[serde(default)]
    pub is_time: bool,
}

/// Set of per-dialect expressions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// One entry per dialect
    #[serde(default)]
    pub dialects: Vec<DialectExpression>,
}

impl Expression {
    /// Single ANSI SQL expression
    #[inline]
    #[must_use]
    pub fn ansi(expression: impl Into<String>) -> Self {
        Self::single(Dialect::AnsiSql, expression)
    }

    /// Single expression in the given dialect
    #[inline]
    #[must_use]
    pub fn single(dialect: Dialect, expression: impl Into<String>) -> Self {
        Self {
            dialects: vec![DialectExpression {
                dialect: Some(dialect),
                expression: expression.into(),
            }],
        }
    }

    /// With an additional dialect
    #[inline]
    #[must_use]
    pub fn with(mut self, dialect: Dialect, expression: impl Into<String>) -> Self {
        self.dialects.push(DialectExpression {
            dialect: Some(dialect),
            expression: expression.into(),
        });
        self
    }

    /// Expression for a dialect, if present
    #[must_use]
    pub fn for_dialect(&self, dialect: &Dialect) -> Option<&str> {
        self.dialects
            .iter()
            .find(|d| d.dialect.as_ref() == Some(dialect))
            .map(|d| d.expression.as_str())
    }
}

/// Expression text in a single dialect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialectExpression {
    /// Target dialect; `None` when the input left it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
    /// Expression text
    #[serde(default)]
    pub expression: String,
}

/// Join between two datasets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Referencing dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Referenced dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Columns on the `from` side
    #[serde(default)]
    pub from_columns: Vec<String>,
    /// Columns on the `to` side, positionally paired with `from_columns`
    #[serde(default)]
    pub to_columns: Vec<String>,
    /// Relationship annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<AiContext>,
}

impl Relationship {
    /// Create relationship between datasets
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        from_columns: &[&str],
        to_columns: &[&str],
    ) -> Self {
        Self {
            name: Some(name.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            from_columns: from_columns.iter().map(ToString::to_string).collect(),
            to_columns: to_columns.iter().map(ToString::to_string).collect(),
            ai_context: None,
        }
    }
}

/// Model level aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Dialect-tagged expressions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Metric annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_context: Option<AiContext>,
}

impl Metric {
    /// Create metric
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, expression: Expression) -> Self {
        Self {
            name: Some(name.into()),
            expression: Some(expression),
            ..Self::default()
        }
    }
}

/// Free-form annotations for downstream search and prompting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AiContext {
    /// Plain instructions text
    Text(String),
    /// Structured annotations
    Structured(AiContextDetails),
}

impl AiContext {
    /// Empty structured placeholder inserted by the validator
    #[inline]
    #[must_use]
    pub fn placeholder() -> Self {
        AiContext::Structured(AiContextDetails::default())
    }

    /// Structured context holding synonyms
    #[must_use]
    pub fn with_synonyms(synonyms: &[&str]) -> Self {
        AiContext::Structured(AiContextDetails {
            synonyms: synonyms.iter().map(ToString::to_string).collect(),
            ..AiContextDetails::default()
        })
    }

    /// Synonyms carried by this context (none for plain text)
    #[must_use]
    pub fn synonyms(&self) -> &[String] {
        match self {
            AiContext::Text(_) => &[],
            AiContext::Structured(details) => &details.synonyms,
        }
    }
}

/// Structured `ai_context` body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiContextDetails {
    /// Usage instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Alternative names
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Example questions or values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}
