//! semgen Model - OSI semantic models
//!
//! Typed representation of an Open Semantic Interchange (OSI) semantic model
//! and the deterministic structural validator that gates it:
//! - Datasets, fields, relationships and metrics
//! - Dialect-tagged expressions
//! - `ai_context` annotations carrying synonyms for downstream search
//! - Token usage accounting shared by the agent crates
//!
//! # Example
//!
//! ```rust
//! use semgen_model::{validate_structure, SemanticModel};
//!
//! let model = SemanticModel::from_json_str(r#"{
//!     "name": "sales",
//!     "datasets": [{
//!         "name": "orders",
//!         "source": "public.orders",
//!         "fields": [{
//!             "name": "id",
//!             "expression": {"dialects": [{"dialect": "ANSI_SQL", "expression": "id"}]}
//!         }]
//!     }]
//! }"#).unwrap();
//!
//! let report = validate_structure(&model);
//! assert!(report.is_valid);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod dialect;
pub mod error;
pub mod types;
pub mod usage;
pub mod validator;

// Re-exports for convenience
pub use dialect::Dialect;
pub use error::ModelError;
pub use types::{
    AiContext, AiContextDetails, Dataset, DialectExpression, Dimension, Expression, Field,
    Metric, Relationship, SemanticModel,
};
pub use usage::TokenUsage;
pub use validator::{validate_structure, StructuralValidator, ValidationReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
