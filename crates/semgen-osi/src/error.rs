//! Error types for specification fetching

/// Errors while fetching the published specification
///
/// None of these escape [`crate::OsiSpecProvider::spec`]; they select the
/// bundled fallback and are logged.
#[derive(Debug, thiserror::Error)]
pub enum SpecFetchError {
    /// Request did not complete within the timeout
    #[error("specification fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Server answered with a non-success status
    #[error("specification fetch returned HTTP {status}")]
    Status { status: u16 },

    /// Transport level failure
    #[error("specification fetch failed: {0}")]
    Transport(String),

    /// Server answered with an empty body
    #[error("specification fetch returned an empty body")]
    EmptyBody,

    /// Remote fetching is turned off
    #[error("remote specification fetching is disabled")]
    Disabled,

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_fetch_error_display() {
        assert_eq!(
            SpecFetchError::Timeout { timeout_ms: 10_000 }.to_string(),
            "specification fetch timed out after 10000ms"
        );
        assert_eq!(
            SpecFetchError::Status { status: 404 }.to_string(),
            "specification fetch returned HTTP 404"
        );
    }
}
