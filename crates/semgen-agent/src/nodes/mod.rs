//! Pipeline nodes
//!
//! Each node reads the [`AgentState`](crate::state::AgentState) and returns a
//! [`StatePatch`](crate::state::StatePatch). Nodes never mutate state and never
//! decide routing; the graph does both.

pub mod discover;
pub mod generate;
pub mod persist;
pub mod plan;
pub mod validate;

pub use discover::discover;
pub use generate::generate;
pub use persist::persist;
pub use plan::plan;
pub use validate::validate;

use crate::catalog::{DiscoveryTools, SchemaCatalog};
use crate::config::AgentConfig;
use crate::llm::ChatModel;
use crate::repository::ModelRepository;
use semgen_model::StructuralValidator;
use semgen_osi::OsiSpecProvider;
use std::sync::Arc;

/// Collaborators shared by every node
#[derive(Clone)]
pub struct NodeContext {
    /// Language model
    pub llm: Arc<dyn ChatModel>,
    /// Schema catalog
    pub catalog: Arc<dyn SchemaCatalog>,
    /// Discovery tools over the catalog
    pub tools: DiscoveryTools,
    /// OSI specification provider
    pub spec: OsiSpecProvider,
    /// Model storage
    pub repository: Arc<dyn ModelRepository>,
    /// Structural validator
    pub validator: StructuralValidator,
    /// Agent configuration
    pub config: AgentConfig,
}

impl NodeContext {
    /// Create context with default configuration and an offline spec provider
    #[must_use]
    pub fn new(
        llm: Arc<dyn ChatModel>,
        catalog: Arc<dyn SchemaCatalog>,
        repository: Arc<dyn ModelRepository>,
    ) -> Self {
        let config = AgentConfig::default();
        Self {
            tools: DiscoveryTools::new(Arc::clone(&catalog), config.sample_row_limit),
            llm,
            catalog,
            spec: OsiSpecProvider::offline(),
            repository,
            validator: StructuralValidator::new(),
            config,
        }
    }

    /// With configuration
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.tools = DiscoveryTools::new(Arc::clone(&self.catalog), config.sample_row_limit);
        self.config = config;
        self
    }

    /// With specification provider
    #[inline]
    #[must_use]
    pub fn with_spec_provider(mut self, spec: OsiSpecProvider) -> Self {
        self.spec = spec;
        self
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("llm", &self.llm.model_name())
            .field("spec", &self.spec.location())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
