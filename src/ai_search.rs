//! AI search delegate: provider abstraction + disabled client.
//!
//! The external service receives `{"query": ...}` and answers
//! `{"results": [...]}` where each element references a job in the current
//! snapshot by its dedup key (either a bare string or an object carrying
//! `dedupKey` / `dedup_key`). Every failure mode collapses to "no results".

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ai::AiSearchConfig;
use crate::ingest::http::{JsonRequest, JsonTransport};
use crate::ingest::snapshot::Snapshot;
use crate::ingest::types::CanonicalJob;

const SOURCE_LABEL: &str = "ai-search";

#[async_trait]
pub trait AiSearch: Send + Sync {
    /// Ranked dedup keys for `query`. Empty means "no AI results".
    async fn search(&self, query: &str) -> Vec<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    fn enabled(&self) -> bool {
        true
    }
}

pub type DynAiSearch = Arc<dyn AiSearch>;

/// Used when no delegate URL is configured.
pub struct DisabledSearch;

#[async_trait]
impl AiSearch for DisabledSearch {
    async fn search(&self, _query: &str) -> Vec<String> {
        Vec::new()
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
    fn enabled(&self) -> bool {
        false
    }
}

pub struct HttpAiSearch {
    url: String,
    transport: Arc<dyn JsonTransport>,
}

impl HttpAiSearch {
    pub fn new(url: impl Into<String>, transport: Arc<dyn JsonTransport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

#[async_trait]
impl AiSearch for HttpAiSearch {
    async fn search(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        // Interactive path: a single attempt, no backoff.
        let req = JsonRequest::post(SOURCE_LABEL, self.url.as_str(), json!({ "query": query }))
            .attempts(1);
        match self.transport.request_json(&req).await {
            Ok(body) => {
                let keys = parse_result_keys(&body);
                debug!(target: "ai_search", results = keys.len(), "ai search answered");
                keys
            }
            Err(e) => {
                warn!(target: "ai_search", error = %e, "ai search failed; falling back");
                Vec::new()
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Pull dedup keys out of a delegate response. Unknown shapes yield nothing.
pub fn parse_result_keys(body: &Value) -> Vec<String> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results
        .iter()
        .filter_map(|el| match el {
            Value::String(s) => Some(s.trim()),
            Value::Object(m) => m
                .get("dedupKey")
                .or_else(|| m.get("dedup_key"))
                .and_then(Value::as_str)
                .map(str::trim),
            _ => None,
        })
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map keys onto snapshot jobs, keeping delegate order. Unknown and repeated
/// keys are dropped.
pub fn resolve(snapshot: &Snapshot, keys: &[String]) -> Vec<CanonicalJob> {
    let mut seen = HashSet::new();
    keys.iter()
        .filter(|k| seen.insert(k.as_str()))
        .filter_map(|k| snapshot.find(k).cloned())
        .collect()
}

/// Factory: HTTP delegate when a usable URL is configured, disabled otherwise.
pub fn build_ai_search(cfg: &AiSearchConfig, transport: Arc<dyn JsonTransport>) -> DynAiSearch {
    match cfg.endpoint() {
        Some(url) => Arc::new(HttpAiSearch::new(url, transport)),
        None => Arc::new(DisabledSearch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strings_and_keyed_objects_only() {
        let body = json!({
            "results": ["a", {"dedupKey": "b"}, {"dedup_key": "c"}, 7, {"title": "x"}, "  "]
        });
        assert_eq!(parse_result_keys(&body), vec!["a", "b", "c"]);
    }

    #[test]
    fn wrong_shapes_give_nothing() {
        assert!(parse_result_keys(&json!({})).is_empty());
        assert!(parse_result_keys(&json!({"results": "a"})).is_empty());
        assert!(parse_result_keys(&json!(["a"])).is_empty());
    }

    #[test]
    fn unconfigured_factory_is_disabled() {
        struct Never;
        #[async_trait]
        impl JsonTransport for Never {
            async fn request_json(
                &self,
                _req: &JsonRequest,
            ) -> Result<Value, crate::ingest::http::FetchError> {
                Err(crate::ingest::http::FetchError::Closed)
            }
        }
        let s = build_ai_search(&AiSearchConfig::default(), Arc::new(Never));
        assert!(!s.enabled());
        assert_eq!(s.provider_name(), "disabled");
    }
}
