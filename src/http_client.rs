use crate::error::PfhubError;
use futures::TryStreamExt;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts
    pub retry_attempts: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds (for exponential backoff cap)
    pub max_retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30000,
            user_agent: format!("pfhub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async HTTP client for Zenodo records and linked data files
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self, PfhubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(PfhubError::from)?;

        Ok(Self { client, config })
    }

    /// Fetch a response body with retry logic and exponential backoff
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, PfhubError> {
        let response = self.get_response_with_retry(url).await?;
        let bytes = response.bytes().await.map_err(PfhubError::from)?;
        Ok(bytes.to_vec())
    }

    /// Fetch and decode a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PfhubError> {
        let bytes = self.get_bytes(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Download `url` into `dest`, named after the last segment of its path
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<PathBuf, PfhubError> {
        let name = file_name(url)?;
        self.download_as(url, &dest.join(name)).await
    }

    /// Stream the body of `url` into the file at `target`
    pub async fn download_as(&self, url: &str, target: &Path) -> Result<PathBuf, PfhubError> {
        let response = self.get_response_with_retry(url).await?;
        write_body(response, target).await?;
        tracing::debug!(%url, target = %target.display(), "downloaded");
        Ok(target.to_path_buf())
    }

    /// Get response with retry logic
    pub async fn get_response_with_retry(&self, url: &str) -> Result<Response, PfhubError> {
        let mut current_attempt = 0;

        loop {
            match self.make_request(url).await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    let error = PfhubError::HttpStatus {
                        url: url.to_string(),
                        status: status.as_u16(),
                        message: format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        ),
                    };

                    // Retry on server errors (5xx) but not client errors (4xx)
                    if status.is_server_error() && current_attempt < self.config.retry_attempts {
                        self.wait_before_retry(current_attempt).await;
                        current_attempt += 1;
                        continue;
                    }

                    return Err(error);
                }
                Err(error) => {
                    if current_attempt < self.config.retry_attempts
                        && self.is_retryable_error(&error)
                    {
                        tracing::debug!(%url, attempt = current_attempt, %error, "retrying request");
                        self.wait_before_retry(current_attempt).await;
                        current_attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Make a single HTTP request with timeout
    async fn make_request(&self, url: &str) -> Result<Response, PfhubError> {
        let request_future = self.client.get(url).send();

        timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request_future,
        )
        .await
        .map_err(|_| PfhubError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(PfhubError::from)
    }

    /// Wait before retry with exponential backoff
    async fn wait_before_retry(&self, attempt: u32) {
        sleep(self.retry_delay(attempt)).await;
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .retry_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.config.max_retry_delay_ms))
    }

    /// Check if an error is retryable
    fn is_retryable_error(&self, error: &PfhubError) -> bool {
        match error {
            // Unresolvable hosts will not start resolving on a retry
            PfhubError::Http(reqwest_error) => {
                reqwest_error.is_timeout()
                    || (reqwest_error.is_connect() && !is_dns_failure(reqwest_error))
            }
            PfhubError::Timeout { .. } => true,
            _ => false,
        }
    }
}

fn is_dns_failure(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        let text = err.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = err.source();
    }
    false
}

async fn write_body(response: Response, target: &Path) -> Result<(), PfhubError> {
    let mut file = tokio::fs::File::create(target).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = TryStreamExt::try_next(&mut stream)
        .await
        .map_err(PfhubError::from)?
    {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Last non-empty segment of a URL path, if the URL names a file
pub fn file_name(url: &str) -> Result<String, PfhubError> {
    let parsed = Url::parse(url).map_err(|e| PfhubError::InvalidUrl {
        url: url.to_string(),
        details: e.to_string(),
    })?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PfhubError::NoFileName {
            url: url.to_string(),
        })
}
