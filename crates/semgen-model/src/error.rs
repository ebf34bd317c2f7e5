//! Error types for semantic model handling

/// Errors while decoding or encoding a semantic model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Input was not valid JSON or did not match the model shape
    #[error("invalid semantic model JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// JSON was well-formed but not an object
    #[error("semantic model must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// Wrapper key present but empty
    #[error("semantic model wrapper '{0}' is empty")]
    EmptyWrapper(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::NotAnObject("array");
        assert!(err.to_string().contains("must be a JSON object"));

        let err = ModelError::EmptyWrapper("semantic_model");
        assert_eq!(err.to_string(), "semantic model wrapper 'semantic_model' is empty");
    }
}
