use crate::config::ProviderConfig;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use url::Url;

/// One failed request attempt.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AttemptError {
    /// Rate limiting, server errors and transport failures are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            AttemptError::Status(s) => *s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error(),
            AttemptError::Transport(e) => !e.is_builder() && !e.is_decode(),
        }
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    config: ProviderConfig,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // The quote-summary endpoint wants the session cookie back
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// GET a URL and decode JSON, with polite delay and retry.
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).with_context(|| format!("Invalid JSON from {}", redact(url)))
    }

    /// GET a URL as text, with polite delay and retry.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        self.polite_delay().await;

        with_retries(&self.config, || self.attempt(url))
            .await
            .with_context(|| format!("All retries exhausted for {}", redact(url)))
    }

    /// Fire-and-forget request whose only purpose is to collect cookies.
    /// Any status is fine; the consent host usually answers 404.
    pub async fn touch(&self, url: &Url) -> Result<()> {
        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;
        debug!("session {} → {}", url, resp.status());
        Ok(())
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<String, AttemptError> {
        debug!("GET {}", redact(url));
        let resp = self.inner.get(url.clone()).send().await.inspect_err(|e| {
            warn!("Request to {} failed: {}", redact(url), e);
        })?;

        let status = resp.status();
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited on {}", redact(url));
            }
            return Err(AttemptError::Status(status));
        }
        Ok(resp.text().await?)
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let jitter_ms = if self.config.jitter_ms > 0 {
            rand::random_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        sleep(Duration::from_millis(self.config.request_delay_ms + jitter_ms)).await;
    }
}

/// Run `action` until it succeeds, fails permanently, or runs out of retries.
async fn with_retries<T, F, Fut>(config: &ProviderConfig, action: F) -> std::result::Result<T, AttemptError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, AttemptError>>,
{
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(config.retry_backoff_ms.max(1))
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(config.max_retries as usize);

    RetryIf::start(strategy, action, AttemptError::is_transient).await
}

/// URL without its query string, so the crumb never lands in logs.
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_transient_statuses() {
        assert!(AttemptError::Status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(AttemptError::Status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!AttemptError::Status(StatusCode::NOT_FOUND).is_transient());
        assert!(!AttemptError::Status(StatusCode::UNAUTHORIZED).is_transient());
    }

    fn fast_retries(max_retries: u32) -> ProviderConfig {
        ProviderConfig {
            max_retries,
            retry_backoff_ms: 1,
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let attempts = &AtomicUsize::new(0);
        let body = with_retries(&fast_retries(3), || async move {
            match attempts.fetch_add(1, Ordering::SeqCst) {
                0 => Err(AttemptError::Status(StatusCode::TOO_MANY_REQUESTS)),
                1 => Err(AttemptError::Status(StatusCode::SERVICE_UNAVAILABLE)),
                _ => Ok("ok".to_string()),
            }
        })
        .await
        .unwrap();

        assert_eq!(body, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_stops_immediately() {
        let attempts = &AtomicUsize::new(0);
        let err = with_retries(&fast_retries(3), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(AttemptError::Status(StatusCode::NOT_FOUND))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AttemptError::Status(StatusCode::NOT_FOUND)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let attempts = &AtomicUsize::new(0);
        let result = with_retries(&fast_retries(2), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(AttemptError::Status(StatusCode::BAD_GATEWAY))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_redact_strips_query() {
        let url = Url::parse("https://query2.finance.yahoo.com/v10/finance/quoteSummary/BBCA.JK?crumb=secret").unwrap();
        assert_eq!(redact(&url), "https://query2.finance.yahoo.com/v10/finance/quoteSummary/BBCA.JK");
    }
}
