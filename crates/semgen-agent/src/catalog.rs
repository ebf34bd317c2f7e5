//! Database schema catalog and the discovery tools built on it

use crate::error::CatalogError;
use crate::llm::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Column description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Database type name
    pub data_type: String,
    /// Whether NULL is allowed
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing columns
    pub columns: Vec<String>,
    /// Referenced table
    pub referenced_table: String,
    /// Referenced columns
    pub referenced_columns: Vec<String>,
}

/// Table description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name (optionally schema-qualified)
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    /// Primary key columns
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Outgoing foreign keys
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

/// Source of schema metadata and sample data
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// All table names
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError>;

    /// Describe one table
    async fn describe_table(&self, table: &str) -> Result<TableSchema, CatalogError>;

    /// Up to `limit` rows of sample data
    async fn sample_rows(&self, table: &str, limit: usize) -> Result<Vec<Value>, CatalogError>;
}

/// Table entry of a catalog snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Schema
    #[serde(flatten)]
    pub schema: TableSchema,
    /// Sample rows
    #[serde(default)]
    pub rows: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    tables: Vec<TableSnapshot>,
}

/// Catalog backed by a JSON snapshot
///
/// ```json
/// { "tables": [ { "name": "orders", "columns": [...], "primary_key": ["id"],
///                 "foreign_keys": [...], "rows": [ {...} ] } ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    tables: BTreeMap<String, TableSnapshot>,
}

impl SnapshotCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a table
    #[must_use]
    pub fn with_table(mut self, table: TableSnapshot) -> Self {
        self.tables.insert(table.schema.name.clone(), table);
        self
    }

    /// Parse a snapshot document
    ///
    /// # Errors
    /// - `CatalogError::InvalidSnapshot` if the document does not match the format
    pub fn from_json_str(input: &str) -> Result<Self, CatalogError> {
        let file: SnapshotFile = serde_json::from_str(input)?;
        Ok(file.tables.into_iter().fold(Self::new(), Self::with_table))
    }

    /// Load a snapshot file
    ///
    /// # Errors
    /// - `CatalogError::Io` if the file cannot be read
    /// - `CatalogError::InvalidSnapshot` if the document does not match the format
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), tables = catalog.len(), "loaded catalog snapshot");
        Ok(catalog)
    }

    /// Number of tables
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the catalog has no tables
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn table(&self, table: &str) -> Result<&TableSnapshot, CatalogError> {
        self.tables
            .get(table)
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl SchemaCatalog for SnapshotCatalog {
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema, CatalogError> {
        Ok(self.table(table)?.schema.clone())
    }

    async fn sample_rows(&self, table: &str, limit: usize) -> Result<Vec<Value>, CatalogError> {
        Ok(self.table(table)?.rows.iter().take(limit).cloned().collect())
    }
}

/// Tool names offered during discovery
pub const LIST_TABLES: &str = "list_tables";
/// Describe-table tool name
pub const DESCRIBE_TABLE: &str = "describe_table";
/// Sample-rows tool name
pub const SAMPLE_ROWS: &str = "sample_rows";

/// Discovery tools exposed to the model
///
/// Every failure is rendered as text for the model; [`DiscoveryTools::execute`]
/// never returns an error.
#[derive(Clone)]
pub struct DiscoveryTools {
    catalog: Arc<dyn SchemaCatalog>,
    sample_row_limit: usize,
}

impl std::fmt::Debug for DiscoveryTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryTools")
            .field("sample_row_limit", &self.sample_row_limit)
            .finish_non_exhaustive()
    }
}

impl DiscoveryTools {
    /// Create tools over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<dyn SchemaCatalog>, sample_row_limit: usize) -> Self {
        Self {
            catalog,
            sample_row_limit,
        }
    }

    /// Tool definitions for the model
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let table_arg = json!({
            "type": "object",
            "properties": { "table": { "type": "string", "description": "Table name" } },
            "required": ["table"],
        });

        vec![
            ToolDefinition {
                name: LIST_TABLES.to_string(),
                description: "List every table in the database".to_string(),
                parameters: json!({ "type": "object", "properties": {} }),
            },
            ToolDefinition {
                name: DESCRIBE_TABLE.to_string(),
                description: "Columns, types, primary key and foreign keys of a table".to_string(),
                parameters: table_arg.clone(),
            },
            ToolDefinition {
                name: SAMPLE_ROWS.to_string(),
                description: format!("Up to {} sample rows from a table", self.sample_row_limit),
                parameters: table_arg,
            },
        ]
    }

    /// Run a tool call, returning the text handed back to the model
    pub async fn execute(&self, call: &ToolCall) -> String {
        let result = match call.name.as_str() {
            LIST_TABLES => self
                .catalog
                .list_tables()
                .await
                .map(|tables| json!(tables)),
            DESCRIBE_TABLE => match table_argument(&call.arguments) {
                Some(table) => self
                    .catalog
                    .describe_table(table)
                    .await
                    .and_then(|schema| serde_json::to_value(schema).map_err(CatalogError::from)),
                None => return missing_table_argument(&call.name),
            },
            SAMPLE_ROWS => match table_argument(&call.arguments) {
                Some(table) => self
                    .catalog
                    .sample_rows(table, self.sample_row_limit)
                    .await
                    .map(Value::Array),
                None => return missing_table_argument(&call.name),
            },
            other => {
                tracing::warn!(tool = other, "model requested unknown tool");
                return format!("Error: unknown tool '{other}'");
            }
        };

        match result {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "discovery tool failed");
                format!("Error: {e}")
            }
        }
    }

    /// Deterministic plain-text digest of the given tables
    ///
    /// Used when the model produces no discovery summary of its own.
    pub async fn schema_digest(&self, tables: &[String]) -> String {
        let mut digest = String::new();
        for table in tables {
            match self.catalog.describe_table(table).await {
                Ok(schema) => {
                    let _ = writeln!(digest, "Table {}:", schema.name);
                    for column in &schema.columns {
                        let null = if column.nullable { "" } else { " NOT NULL" };
                        let _ = writeln!(digest, "  - {} {}{}", column.name, column.data_type, null);
                    }
                    if !schema.primary_key.is_empty() {
                        let _ = writeln!(digest, "  primary key: {}", schema.primary_key.join(", "));
                    }
                    for fk in &schema.foreign_keys {
                        let _ = writeln!(
                            digest,
                            "  foreign key: ({}) -> {}({})",
                            fk.columns.join(", "),
                            fk.referenced_table,
                            fk.referenced_columns.join(", ")
                        );
                    }
                }
                Err(e) => {
                    let _ = writeln!(digest, "Table {table}: unavailable ({e})");
                }
            }
        }
        digest
    }
}

fn table_argument(arguments: &Value) -> Option<&str> {
    arguments.get("table").and_then(Value::as_str)
}

fn missing_table_argument(tool: &str) -> String {
    format!("Error: tool '{tool}' requires a string 'table' argument")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"{
        "tables": [
            {
                "name": "customers",
                "columns": [
                    {"name": "id", "data_type": "integer", "nullable": false},
                    {"name": "email", "data_type": "text"}
                ],
                "primary_key": ["id"],
                "rows": [{"id": 1, "email": "a@x.io"}, {"id": 2, "email": "b@x.io"}]
            },
            {
                "name": "orders",
                "columns": [
                    {"name": "id", "data_type": "integer", "nullable": false},
                    {"name": "customer_id", "data_type": "integer"}
                ],
                "primary_key": ["id"],
                "foreign_keys": [
                    {"columns": ["customer_id"], "referenced_table": "customers", "referenced_columns": ["id"]}
                ]
            }
        ]
    }"#;

    fn tools(limit: usize) -> DiscoveryTools {
        let catalog = SnapshotCatalog::from_json_str(SNAPSHOT).unwrap();
        DiscoveryTools::new(Arc::new(catalog), limit)
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "c1".into(),
            name: name.into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn snapshot_lists_and_describes() {
        let catalog = SnapshotCatalog::from_json_str(SNAPSHOT).unwrap();

        assert_eq!(
            catalog.list_tables().await.unwrap(),
            vec!["customers".to_string(), "orders".to_string()]
        );
        let orders = catalog.describe_table("orders").await.unwrap();
        assert_eq!(orders.foreign_keys[0].referenced_table, "customers");
        assert!(orders.columns[1].nullable);
        assert!(matches!(
            catalog.describe_table("missing").await,
            Err(CatalogError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn sample_rows_respects_limit() {
        let output = tools(1).execute(&call(SAMPLE_ROWS, json!({"table": "customers"}))).await;
        let rows: Vec<Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn tool_errors_become_text() {
        let tools = tools(5);

        let unknown_table = tools.execute(&call(DESCRIBE_TABLE, json!({"table": "nope"}))).await;
        assert_eq!(unknown_table, "Error: table not found: nope");

        let missing_arg = tools.execute(&call(SAMPLE_ROWS, json!({}))).await;
        assert!(missing_arg.contains("requires a string 'table' argument"));

        let unknown_tool = tools.execute(&call("drop_table", json!({}))).await;
        assert_eq!(unknown_tool, "Error: unknown tool 'drop_table'");
    }

    #[tokio::test]
    async fn schema_digest_is_deterministic() {
        let tools = tools(5);
        let tables = vec!["orders".to_string(), "ghost".to_string()];

        let digest = tools.schema_digest(&tables).await;

        assert!(digest.contains("Table orders:"));
        assert!(digest.contains("  - id integer NOT NULL"));
        assert!(digest.contains("foreign key: (customer_id) -> customers(id)"));
        assert!(digest.contains("Table ghost: unavailable"));
        assert_eq!(digest, tools.schema_digest(&tables).await);
    }

    #[test]
    fn definitions_cover_all_tools() {
        let names: Vec<_> = tools(3).definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![LIST_TABLES, DESCRIBE_TABLE, SAMPLE_ROWS]);
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = SnapshotCatalog::load("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
