//! Configuration file
//!
//! ```toml
//! output_dir = "models"
//!
//! [llm]
//! model = "gpt-4o"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [osi]
//! offline = false
//! ttl_secs = 3600
//!
//! [agent]
//! validation_policy = "structural_gate"
//! max_validation_attempts = 3
//! ```
//!
//! Every key is optional. Command line flags override the file.

use semgen_agent::{AgentConfig, LlmConfig, ValidationPolicy};
use semgen_osi::OsiSpecConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// API key variable unset
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemgenConfig {
    /// Chat model endpoint
    pub llm: LlmConfig,
    /// Specification provider
    pub osi: OsiSpecConfig,
    /// Agent behaviour
    pub agent: AgentConfig,
    /// Where model records are written
    pub output_dir: PathBuf,
}

impl Default for SemgenConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            osi: OsiSpecConfig::default(),
            agent: AgentConfig::default(),
            output_dir: PathBuf::from("semgen-models"),
        }
    }
}

/// Command line overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Output directory
    pub output_dir: Option<PathBuf>,
    /// Validation policy
    pub validation_policy: Option<ValidationPolicy>,
    /// Force offline specification
    pub offline: bool,
    /// Chat model name
    pub model: Option<String>,
}

impl SemgenConfig {
    /// Parse configuration text
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid configuration
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load from a file, or defaults when no path is given
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid configuration
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::debug!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply command line overrides
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(policy) = overrides.validation_policy {
            self.agent.validation_policy = policy;
        }
        if overrides.offline {
            self.osi.offline = true;
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        self
    }

    /// API key from the configured environment variable
    ///
    /// # Errors
    /// - `ConfigError::MissingApiKey` if the variable is unset or empty
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey(self.llm.api_key_env.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SemgenConfig::from_toml_str("", Path::new("semgen.toml")).unwrap();
        assert_eq!(config, SemgenConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            output_dir = "out"

            [llm]
            model = "gpt-4o-mini"

            [osi]
            offline = true

            [agent]
            validation_policy = "llm_gate"
            max_validation_attempts = 5
        "#;

        let config = SemgenConfig::from_toml_str(text, Path::new("semgen.toml")).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert!(config.osi.offline);
        assert_eq!(config.agent.validation_policy, ValidationPolicy::LlmGate);
        assert_eq!(config.agent.max_validation_attempts, 5);
        assert_eq!(config.agent.quality_review_max_chars, 100_000);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let err = SemgenConfig::from_toml_str("[agent\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().starts_with("invalid config bad.toml"));
    }

    #[test]
    fn overrides_win() {
        let config = SemgenConfig::default().with_overrides(Overrides {
            output_dir: Some(PathBuf::from("elsewhere")),
            validation_policy: Some(ValidationPolicy::LlmGate),
            offline: true,
            model: Some("local".into()),
        });

        assert_eq!(config.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.agent.validation_policy, ValidationPolicy::LlmGate);
        assert!(config.osi.offline);
        assert_eq!(config.llm.model, "local");
    }

    #[test]
    fn missing_api_key_is_reported() {
        let mut config = SemgenConfig::default();
        config.llm.api_key_env = "SEMGEN_TEST_KEY_THAT_IS_NEVER_SET".into();
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::MissingApiKey(name)) if name == "SEMGEN_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SemgenConfig::load(Some(Path::new("/no/such/semgen.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
