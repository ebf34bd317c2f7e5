//! semgen OSI - specification provider
//!
//! Supplies the Open Semantic Interchange specification text that the
//! generation prompts are grounded on.
//!
//! # Resolution order
//!
//! ```text
//! OsiSpecProvider::spec()
//!     ├─ SpecCache hit (TTL, default 1h) ──────────────→ cached spec
//!     ├─ SpecSource::fetch() (HTTP, 10s timeout) ok ───→ cache + return
//!     └─ any failure ──────────────────────────────────→ bundled copy
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use semgen_osi::{OsiSpecConfig, OsiSpecProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OsiSpecProvider::from_config(&OsiSpecConfig::default())?;
//! let spec = provider.spec().await;
//! println!("OSI {} from {}", spec.version().unwrap_or_default(), spec.origin);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod provider;
pub mod source;
pub mod spec;

// Re-exports for convenience
pub use cache::SpecCache;
pub use config::OsiSpecConfig;
pub use error::SpecFetchError;
pub use provider::OsiSpecProvider;
pub use source::{HttpSpecSource, OfflineSpecSource, SpecSource};
pub use spec::{OsiSpec, SpecOrigin, BUNDLED_OSI_SPEC};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
