// src/ingest/http.rs
//! Outbound JSON transport shared by every board client and the AI search
//! delegate: one lazily built `reqwest::Client`, bounded retry with
//! exponential backoff, explicit close at shutdown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single JSON request. `source` is the log key; URLs are never logged
/// because some boards carry credentials in the path or query.
#[derive(Debug, Clone)]
pub struct JsonRequest {
    pub source: String,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the transport's retry budget (e.g. 1 for interactive calls).
    pub max_attempts: Option<u32>,
}

impl JsonRequest {
    pub fn get(source: &str, url: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            max_attempts: None,
        }
    }

    pub fn post(source: &str, url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            ..Self::get(source, url)
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n.max(1));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("http client is closed")]
    Closed,
}

impl FetchError {
    /// Timeouts, connection errors and non-2xx answers are retried;
    /// an unparseable body or a closed client is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Status(_))
    }
}

#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn request_json(&self, req: &JsonRequest) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Backoff after failed attempt `attempt` (1-based): base * 2^attempt, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. No sleep follows the final attempt.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    source: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_retryable() || attempt >= attempts => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    target: "ingest",
                    source,
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "request attempt failed"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientCfg {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for HttpClientCfg {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("ksa-jobs/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

enum Slot {
    Unbuilt,
    Ready(reqwest::Client),
    Closed,
}

/// Process-wide connection pool. Built on first use, shared by every
/// caller (reqwest clients are cheap handles), released by `close()`.
pub struct HttpClient {
    cfg: HttpClientCfg,
    slot: Mutex<Slot>,
}

impl HttpClient {
    pub fn new(cfg: HttpClientCfg) -> Self {
        Self {
            cfg,
            slot: Mutex::new(Slot::Unbuilt),
        }
    }

    fn client(&self) -> Result<reqwest::Client, FetchError> {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        match &*slot {
            Slot::Ready(c) => Ok(c.clone()),
            Slot::Closed => Err(FetchError::Closed),
            Slot::Unbuilt => {
                let c = reqwest::Client::builder()
                    .user_agent(self.cfg.user_agent.clone())
                    .connect_timeout(self.cfg.connect_timeout)
                    .timeout(self.cfg.timeout)
                    .build()
                    .map_err(|e| FetchError::Transport(e.to_string()))?;
                *slot = Slot::Ready(c.clone());
                Ok(c)
            }
        }
    }

    /// Drop the pool. Later requests fail with `FetchError::Closed`.
    pub fn close(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Slot::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            *self.slot.lock().unwrap_or_else(|p| p.into_inner()),
            Slot::Closed
        )
    }

    pub fn is_built(&self) -> bool {
        matches!(
            *self.slot.lock().unwrap_or_else(|p| p.into_inner()),
            Slot::Ready(_)
        )
    }

    async fn send_once(&self, req: &JsonRequest) -> Result<Value, FetchError> {
        let client = self.client()?;
        let mut rb = match req.method {
            Method::Get => client.get(&req.url),
            Method::Post => client.post(&req.url),
        };
        if !req.query.is_empty() {
            rb = rb.query(&req.query);
        }
        for (k, v) in &req.headers {
            rb = rb.header(k.as_str(), v.as_str());
        }
        if let Some(body) = &req.body {
            rb = rb.json(body);
        }

        let resp = rb
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl JsonTransport for HttpClient {
    async fn request_json(&self, req: &JsonRequest) -> Result<Value, FetchError> {
        let policy = RetryPolicy {
            max_attempts: req.max_attempts.unwrap_or(self.cfg.retry.max_attempts),
            ..self.cfg.retry
        };
        with_retry(policy, &req.source, |_| self.send_once(req)).await
    }
}
