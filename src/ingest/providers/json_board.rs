// src/ingest/providers/json_board.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use tracing::{info, warn};

use crate::ingest::http::{FetchError, JsonRequest, JsonTransport};
use crate::ingest::types::{FetchOutcome, SourceProvider};

/// Values that are clearly not real keys, compared case-insensitively.
const GENERIC_PLACEHOLDERS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "your_api_key",
    "your-api-key",
    "your_key_here",
    "api_key",
    "xxx",
    "todo",
    "none",
    "null",
];

/// A credential slot: env-provided value plus fragments known to belong to
/// sample keys that shipped in old configs.
#[derive(Debug, Clone)]
pub struct Credential {
    pub label: &'static str,
    pub value: Option<String>,
    pub known_placeholders: &'static [&'static str],
}

impl Credential {
    pub fn new(label: &'static str, value: Option<String>) -> Self {
        Self {
            label,
            value,
            known_placeholders: &[],
        }
    }

    pub fn with_placeholders(mut self, fragments: &'static [&'static str]) -> Self {
        self.known_placeholders = fragments;
        self
    }

    /// Trimmed value if it is usable, else the reason it is not.
    pub fn usable(&self) -> Result<&str, String> {
        let v = self.value.as_deref().map(str::trim).unwrap_or_default();
        if v.is_empty() {
            return Err(format!("{} missing", self.label));
        }
        if is_placeholder(v, self.known_placeholders) {
            return Err(format!("{} is a placeholder", self.label));
        }
        Ok(v)
    }
}

pub fn is_placeholder(value: &str, known_fragments: &[&str]) -> bool {
    let v = value.trim();
    if v.is_empty() {
        return true;
    }
    let lower = v.to_ascii_lowercase();
    if GENERIC_PLACEHOLDERS.contains(&lower.as_str()) {
        return true;
    }
    if lower.starts_with('<') && lower.ends_with('>') {
        return true;
    }
    known_fragments
        .iter()
        .any(|f| !f.is_empty() && lower.contains(&f.to_ascii_lowercase()))
}

/// Where the job list lives in a board's response.
#[derive(Debug, Clone, Copy)]
pub struct ListShape {
    /// Top-level keys tried in order; the first non-empty array wins.
    pub keys: &'static [&'static str],
    /// Whether a bare top-level array is also a valid answer.
    pub bare_list: bool,
}

/// Pull the job list out of a response body. An object without any of the
/// keys is an empty list; a body that is neither object nor (accepted)
/// array is malformed.
pub fn extract_job_list(body: Value, shape: ListShape) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(items) if shape.bare_list => Ok(items),
        Value::Object(mut map) => {
            for key in shape.keys {
                if let Some(Value::Array(items)) = map.remove(*key) {
                    if !items.is_empty() {
                        return Ok(items);
                    }
                }
            }
            Ok(Vec::new())
        }
        Value::Array(_) => Err(FetchError::Malformed(
            "top-level array where an object was expected".into(),
        )),
        other => Err(FetchError::Malformed(format!(
            "expected JSON object, got {}",
            match other {
                Value::Null => "null",
                Value::Bool(_) => "bool",
                Value::Number(_) => "number",
                _ => "string",
            }
        ))),
    }
}

/// A job board reached with one JSON request per fetch.
pub struct JsonBoard {
    name: &'static str,
    shape: ListShape,
    /// `Err(reason)` when a credential is unusable; no request is ever built.
    request: Result<JsonRequest, String>,
    transport: Arc<dyn JsonTransport>,
}

impl JsonBoard {
    /// Board without credentials.
    pub fn open(
        name: &'static str,
        shape: ListShape,
        request: JsonRequest,
        transport: Arc<dyn JsonTransport>,
    ) -> Self {
        Self {
            name,
            shape,
            request: Ok(request),
            transport,
        }
    }

    /// Board that needs every credential in `creds`. `build` receives the
    /// usable values in the same order and is only called when all are usable.
    pub fn with_credentials<F>(
        name: &'static str,
        shape: ListShape,
        creds: &[Credential],
        transport: Arc<dyn JsonTransport>,
        build: F,
    ) -> Self
    where
        F: FnOnce(&[&str]) -> JsonRequest,
    {
        let request = creds
            .iter()
            .map(Credential::usable)
            .collect::<Result<Vec<_>, _>>()
            .map(|vals| build(&vals));
        Self {
            name,
            shape,
            request,
            transport,
        }
    }
}

#[async_trait]
impl SourceProvider for JsonBoard {
    async fn fetch(&self) -> FetchOutcome {
        let req = match &self.request {
            Ok(req) => req,
            Err(reason) => {
                warn!(target: "ingest", source = self.name, reason = %reason, "source disabled");
                return FetchOutcome::Disabled(reason.clone());
            }
        };

        let result = self
            .transport
            .request_json(req)
            .await
            .and_then(|body| extract_job_list(body, self.shape));

        match result {
            Ok(items) => {
                info!(target: "ingest", source = self.name, count = items.len(), "source fetched");
                FetchOutcome::Fetched(items)
            }
            Err(e) => {
                warn!(target: "ingest", source = self.name, error = %e, "source failed");
                counter!("ingest_source_errors_total", "source" => self.name).increment(1);
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        self.name
    }

    fn enabled(&self) -> bool {
        self.request.is_ok()
    }
}
