// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One job record exactly as a board returned it. No key is guaranteed;
/// every accessor is total and falls back to "absent" instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wrap a JSON value; anything but an object is a per-item error.
    pub fn from_value(value: Value) -> Result<Self, ItemError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ItemError::NotAnObject(json_kind(&other))),
        }
    }

    /// Raw value for `key`; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// First key in `keys` holding a non-empty value (null, blank strings,
    /// empty arrays and empty objects are skipped).
    pub fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !is_blank(v))
    }

    /// `first_of` coerced to a trimmed string, or "".
    pub fn str_of(&self, keys: &[&str]) -> String {
        self.first_of(keys).map(value_to_string).unwrap_or_default()
    }

    /// Boolean flag under the first present key. Accepts JSON booleans and
    /// "true"/"false" strings; anything else is `None`.
    pub fn flag_of(&self, keys: &[&str]) -> Option<bool> {
        keys.iter().filter_map(|k| self.get(k)).find_map(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    /// Nested object under `key`, if it is one.
    pub fn object_at(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce any JSON value into a trimmed display string.
/// Arrays are joined with ", "; objects use `display_name` or `name`.
pub fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => ["display_name", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobCategory {
    Remote,
    OnSiteRegional,
    Unclassified,
}

/// Unified job shape published in every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalJob {
    pub source: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub description: String,
    pub job_type: String,
    pub job_industry: String,
    pub location: String,
    pub remote: bool,
    pub job_category: JobCategory,
    pub pub_date: Option<DateTime<Utc>>,
    pub dedup_key: String,
}

/// What a board fetch produced. Clients never return errors; failures are
/// folded into `Disabled` / `Failed` and contribute no records.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Vec<Value>),
    Disabled(String),
    Failed(String),
}

impl FetchOutcome {
    pub fn into_records(self) -> Vec<Value> {
        match self {
            FetchOutcome::Fetched(v) => v,
            FetchOutcome::Disabled(_) | FetchOutcome::Failed(_) => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch(&self) -> FetchOutcome;
    fn name(&self) -> &str;
    /// False when a required credential is missing or a placeholder.
    fn enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("record is a JSON {0}, expected an object")]
    NotAnObject(&'static str),
    #[error("record processing panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> RawRecord {
        RawRecord::from_value(v).unwrap()
    }

    #[test]
    fn first_of_skips_blank_values() {
        let r = rec(json!({"title": "  ", "jobTitle": null, "name": "Rust Dev"}));
        assert_eq!(r.str_of(&["title", "jobTitle", "name"]), "Rust Dev");
        assert_eq!(r.str_of(&["missing"]), "");
    }

    #[test]
    fn flags_accept_bool_and_true_string() {
        let r = rec(json!({"a": true, "b": "TRUE", "c": "yes", "d": 1}));
        assert_eq!(r.flag_of(&["a"]), Some(true));
        assert_eq!(r.flag_of(&["b"]), Some(true));
        assert_eq!(r.flag_of(&["c"]), None);
        assert_eq!(r.flag_of(&["d"]), None);
    }

    #[test]
    fn coercion_is_total() {
        assert_eq!(value_to_string(&json!(["Full-time", "", "Contract"])), "Full-time, Contract");
        assert_eq!(value_to_string(&json!({"display_name": " Acme "})), "Acme");
        assert_eq!(value_to_string(&json!(42)), "42");
        assert_eq!(value_to_string(&Value::Null), "");
    }

    #[test]
    fn non_objects_are_item_errors() {
        assert_eq!(
            RawRecord::from_value(json!("oops")),
            Err(ItemError::NotAnObject("string"))
        );
    }

    #[test]
    fn canonical_job_serializes_camel_case() {
        let job = CanonicalJob {
            source: "remotive".into(),
            title: "t".into(),
            company: "c".into(),
            url: "u".into(),
            description: String::new(),
            job_type: String::new(),
            job_industry: String::new(),
            location: String::new(),
            remote: true,
            job_category: JobCategory::Remote,
            pub_date: None,
            dedup_key: "k".into(),
        };
        let v = serde_json::to_value(&job).unwrap();
        assert_eq!(v["jobCategory"], "Remote");
        assert!(v.get("dedupKey").is_some());
        assert!(v.get("jobType").is_some());
        assert!(v["pubDate"].is_null());
    }
}
