//! Specification document

use chrono::{DateTime, Utc};
use std::fmt;

/// Compiled-in copy of the OSI core specification
pub const BUNDLED_OSI_SPEC: &str = include_str!("../assets/osi-core-spec.yaml");

/// Where a specification document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecOrigin {
    /// Fetched from the published location
    Remote {
        /// Source URL
        url: String,
    },
    /// Compiled-in fallback copy
    Bundled,
}

impl fmt::Display for SpecOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecOrigin::Remote { url } => write!(f, "{url}"),
            SpecOrigin::Bundled => f.write_str("bundled copy"),
        }
    }
}

/// An OSI specification document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsiSpec {
    /// Raw specification text
    pub text: String,
    /// Where the text came from
    pub origin: SpecOrigin,
    /// When the text was obtained
    pub fetched_at: DateTime<Utc>,
}

impl OsiSpec {
    /// Spec fetched from a remote location now
    #[must_use]
    pub fn remote(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: SpecOrigin::Remote { url: url.into() },
            fetched_at: Utc::now(),
        }
    }

    /// The bundled copy
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            text: BUNDLED_OSI_SPEC.to_string(),
            origin: SpecOrigin::Bundled,
            fetched_at: Utc::now(),
        }
    }

    /// Whether this is the compiled-in fallback
    #[inline]
    #[must_use]
    pub fn is_bundled(&self) -> bool {
        matches!(self.origin, SpecOrigin::Bundled)
    }

    /// Top level `version` entry, when the text is YAML and declares one
    #[must_use]
    pub fn version(&self) -> Option<String> {
        let doc: serde_yaml::Value = serde_yaml::from_str(&self.text).ok()?;
        match doc.get("version")? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Specification text cut to at most `max_chars` characters
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte_index, _)) => &self.text[..byte_index],
            None => &self.text,
        }
    }
}
