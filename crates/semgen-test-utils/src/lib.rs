//! Testing utilities for the semgen workspace
//!
//! Shared fixtures, a scripted chat model and recording collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use semgen_agent::{
    AgentConfig, ChatMessage, ChatModel, ChatResponse, InMemoryModelRepository, LlmError,
    ProgressError, ProgressReporter, RunProgress, SemanticModelAgent, SnapshotCatalog, ToolCall,
    ToolDefinition,
};
use semgen_model::{
    AiContext, Dataset, Expression, Field, Metric, Relationship, SemanticModel, TokenUsage,
};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

pub const SAMPLE_CATALOG_JSON: &str = r#"{
    "tables": [
        {
            "name": "customers",
            "columns": [
                {"name": "id", "data_type": "integer", "nullable": false},
                {"name": "name", "data_type": "text"},
                {"name": "created_at", "data_type": "timestamp"}
            ],
            "primary_key": ["id"],
            "rows": [
                {"id": 1, "name": "Ada", "created_at": "2024-01-02T10:00:00Z"},
                {"id": 2, "name": "Linus", "created_at": "2024-02-03T11:00:00Z"}
            ]
        },
        {
            "name": "orders",
            "columns": [
                {"name": "id", "data_type": "integer", "nullable": false},
                {"name": "customer_id", "data_type": "integer", "nullable": false},
                {"name": "amount", "data_type": "numeric"},
                {"name": "ordered_at", "data_type": "timestamp"}
            ],
            "primary_key": ["id"],
            "foreign_keys": [
                {"columns": ["customer_id"], "referenced_table": "customers", "referenced_columns": ["id"]}
            ],
            "rows": [
                {"id": 10, "customer_id": 1, "amount": 99.5, "ordered_at": "2024-03-01T09:00:00Z"}
            ]
        }
    ]
}"#;

pub fn sample_catalog() -> SnapshotCatalog {
    SnapshotCatalog::from_json_str(SAMPLE_CATALOG_JSON).unwrap()
}

/// Model that passes structural validation without warnings
pub fn valid_model() -> SemanticModel {
    let mut model = SemanticModel::new("commerce")
        .with_dataset(
            Dataset::new("customers", "public.customers")
                .with_primary_key(&["id"])
                .with_ai_context(AiContext::with_synonyms(&["clients", "buyers"]))
                .with_field(Field::column("id").with_ai_context(AiContext::with_synonyms(&["customer id"])))
                .with_field(
                    Field::column("created_at")
                        .time_dimension()
                        .with_ai_context(AiContext::with_synonyms(&["signup date"])),
                ),
        )
        .with_dataset(
            Dataset::new("orders", "public.orders")
                .with_primary_key(&["id"])
                .with_ai_context(AiContext::with_synonyms(&["purchases"]))
                .with_field(Field::column("id").with_ai_context(AiContext::with_synonyms(&["order id"])))
                .with_field(
                    Field::column("amount").with_ai_context(AiContext::with_synonyms(&["revenue"])),
                ),
        )
        .with_relationship(Relationship::new(
            "orders_customer",
            "orders",
            "customers",
            &["customer_id"],
            &["id"],
        ))
        .with_metric(Metric {
            ai_context: Some(AiContext::with_synonyms(&["sales"])),
            ..Metric::new("total_revenue", Expression::ansi("SUM(orders.amount)"))
        });
    model.ai_context = Some(AiContext::with_synonyms(&["shop"]));
    model
}

pub fn valid_model_json() -> String {
    valid_model().to_json_pretty().unwrap()
}

/// Model with fatal structural issues: an empty dataset and a dangling relationship
pub fn invalid_model_json() -> String {
    serde_json::json!({
        "name": "broken",
        "datasets": [
            {"name": "orders", "source": "public.orders", "fields": []}
        ],
        "relationships": [
            {"name": "orders_ghost", "from": "orders", "to": "ghosts",
             "from_columns": ["ghost_id"], "to_columns": ["id"]}
        ]
    })
    .to_string()
}

/// Valid model whose serialized form has at least `min_chars` characters
pub fn large_model(min_chars: usize) -> SemanticModel {
    let mut model = valid_model();
    let mut index = 0;
    while model.serialized_len() < min_chars {
        let mut dataset = Dataset::new(format!("wide_table_{index}"), format!("public.wide_table_{index}"))
            .with_ai_context(AiContext::with_synonyms(&["wide"]));
        for column in 0..50 {
            dataset = dataset.with_field(
                Field::column(format!("column_with_a_long_descriptive_name_{column}"))
                    .with_ai_context(AiContext::with_synonyms(&["measure"])),
            );
        }
        model = model.with_dataset(dataset);
        index += 1;
    }
    model
}

/// Wrap a model as a fenced reply, as chat models tend to
pub fn fenced(json: &str) -> String {
    format!("Here is the semantic model:\n```json\n{json}\n```")
}

/// Chat model replaying a script of responses
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then_text(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .push_back(Ok(ChatResponse::text(content, TokenUsage::new(10, 5))));
        self
    }

    #[must_use]
    pub fn then_error(self, error: LlmError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    #[must_use]
    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.script.lock().push_back(Ok(ChatResponse {
            content: String::new(),
            usage: TokenUsage::new(3, 2),
            tool_calls: calls,
        }));
        self
    }

    /// Plan and discovery replies, so the next scripted entry is the first generate reply
    #[must_use]
    pub fn with_preamble(self) -> Self {
        self.then_text("Inspect customers and orders; confirm the orders.customer_id join.")
            .then_text("customers(id, name, created_at); orders(id, customer_id, amount, ordered_at)")
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    fn next(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        self.requests.lock().push(messages.to_vec());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Config("script exhausted".into())))
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        self.next(messages)
    }

    async fn invoke_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        self.next(messages)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Progress reporter that always fails
#[derive(Debug, Default)]
pub struct FailingProgressReporter {
    calls: Mutex<usize>,
}

impl FailingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ProgressReporter for FailingProgressReporter {
    async fn update_run_progress(
        &self,
        _run_id: Uuid,
        _progress: RunProgress,
    ) -> Result<(), ProgressError> {
        *self.calls.lock() += 1;
        Err(ProgressError::Unavailable("progress service is down".into()))
    }
}

/// Progress reporter whose updates never complete
#[derive(Debug, Default)]
pub struct StalledProgressReporter {
    calls: Mutex<usize>,
}

impl StalledProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ProgressReporter for StalledProgressReporter {
    async fn update_run_progress(
        &self,
        _run_id: Uuid,
        _progress: RunProgress,
    ) -> Result<(), ProgressError> {
        *self.calls.lock() += 1;
        std::future::pending().await
    }
}

/// Progress reporter keeping every update
#[derive(Debug, Default)]
pub struct RecordingProgressReporter {
    updates: Mutex<Vec<(Uuid, RunProgress)>>,
}

impl RecordingProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(Uuid, RunProgress)> {
        self.updates.lock().clone()
    }

    /// Step keys in reporting order
    pub fn steps(&self) -> Vec<String> {
        self.updates
            .lock()
            .iter()
            .map(|(_, progress)| progress.current_step.clone())
            .collect()
    }
}

#[async_trait]
impl ProgressReporter for RecordingProgressReporter {
    async fn update_run_progress(
        &self,
        run_id: Uuid,
        progress: RunProgress,
    ) -> Result<(), ProgressError> {
        self.updates.lock().push((run_id, progress));
        Ok(())
    }
}

/// Agent over the sample catalog with an in-memory repository and no retry backoff
pub fn setup_test_agent(
    llm: Arc<ScriptedChatModel>,
    config: AgentConfig,
) -> (SemanticModelAgent, Arc<InMemoryModelRepository>) {
    let repository = Arc::new(InMemoryModelRepository::new());
    let agent = SemanticModelAgent::new(llm, Arc::new(sample_catalog()), repository.clone())
        .with_config(config);
    (agent, repository)
}

pub fn fast_config() -> AgentConfig {
    AgentConfig::new().with_llm_retries(2, 0)
}
