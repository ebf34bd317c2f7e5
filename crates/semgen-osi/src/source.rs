//! Specification sources

use crate::config::OsiSpecConfig;
use crate::error::SpecFetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Remote location the specification text is fetched from
#[async_trait]
pub trait SpecSource: Send + Sync + std::fmt::Debug {
    /// Stable identifier of the location (used as cache key)
    fn location(&self) -> &str;

    /// Fetch the raw specification text
    async fn fetch(&self) -> Result<String, SpecFetchError>;
}

/// HTTP(S) specification source
#[derive(Debug, Clone)]
pub struct HttpSpecSource {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpSpecSource {
    /// Create source with an explicit timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SpecFetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpecFetchError::Client(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// Create source from configuration
    pub fn from_config(config: &OsiSpecConfig) -> Result<Self, SpecFetchError> {
        Self::new(config.url.clone(), config.timeout())
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn map_transport(&self, error: &reqwest::Error) -> SpecFetchError {
        if error.is_timeout() {
            SpecFetchError::Timeout {
                timeout_ms: self.timeout_ms(),
            }
        } else {
            SpecFetchError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl SpecSource for HttpSpecSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String, SpecFetchError> {
        tracing::debug!(url = %self.url, "fetching OSI specification");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpecFetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(&e))?;
        if body.trim().is_empty() {
            return Err(SpecFetchError::EmptyBody);
        }

        Ok(body)
    }
}

/// Source that never reaches the network
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSpecSource;

#[async_trait]
impl SpecSource for OfflineSpecSource {
    fn location(&self) -> &str {
        "offline"
    }

    async fn fetch(&self) -> Result<String, SpecFetchError> {
        Err(SpecFetchError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a random local port
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/spec.yaml")
    }

    #[tokio::test]
    async fn fetches_body_on_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 14\r\nConnection: close\r\n\r\nversion: \"1.0\"",
        )
        .await;
        let source = HttpSpecSource::new(url, Duration::from_secs(5)).unwrap();

        let body = source.fetch().await.unwrap();
        assert_eq!(body, "version: \"1.0\"");
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let source = HttpSpecSource::new(url, Duration::from_secs(5)).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SpecFetchError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn empty_body_is_error() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n  ").await;
        let source = HttpSpecSource::new(url, Duration::from_secs(5)).unwrap();

        assert!(matches!(source.fetch().await, Err(SpecFetchError::EmptyBody)));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let source =
            HttpSpecSource::new(format!("http://{addr}/spec.yaml"), Duration::from_millis(200))
                .unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, SpecFetchError::Timeout { timeout_ms: 200 }));
    }

    #[tokio::test]
    async fn offline_source_is_disabled() {
        let source = OfflineSpecSource;
        assert_eq!(source.location(), "offline");
        assert!(matches!(source.fetch().await, Err(SpecFetchError::Disabled)));
    }
}
