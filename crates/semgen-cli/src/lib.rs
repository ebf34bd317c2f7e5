//! semgen CLI - command line front end for the semantic model agent
//!
//! Configuration comes from an optional TOML file (see [`config`]) with
//! command line flags layered on top. The binary wires a catalog snapshot,
//! an OpenAI compatible chat model, the OSI spec provider and a file-backed
//! model repository into a [`semgen_agent::SemanticModelAgent`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod commands;
pub mod config;
pub mod logging;

// Re-exports for convenience
pub use commands::{RunSummary, SpecSummary};
pub use config::{ConfigError, Overrides, SemgenConfig};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
