// src/ingest/normalize.rs
//! Raw board record -> `CanonicalJob`.
//!
//! A default alias table covers most boards; a few sources get a field
//! override applied on top (selected by source name).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ingest::fields::{
    raw_location, remote_flag, COMPANY_KEYS, DESCRIPTION_KEYS, INDUSTRY_KEYS, JOB_TYPE_KEYS,
    PUB_DATE_KEYS, TITLE_KEYS, URL_KEYS,
};
use crate::ingest::providers::{ADZUNA, OPENWEBNINJA};
use crate::ingest::types::{value_to_string, CanonicalJob, JobCategory, RawRecord};
use crate::relevance::RelevanceClassifier;

/// Sources whose schema needs fields replaced after the default mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOverride {
    Default,
    /// company/location nested under `display_name`, link in `redirect_url`.
    Adzuna,
    /// JSearch: location from `job_city` / `job_state` / `job_country`.
    OpenWebNinja,
}

impl SourceOverride {
    pub fn for_source(source: &str) -> Self {
        match source {
            ADZUNA => SourceOverride::Adzuna,
            OPENWEBNINJA => SourceOverride::OpenWebNinja,
            _ => SourceOverride::Default,
        }
    }
}

/// SHA-256 hex of `title|company|url`.
pub fn fingerprint(title: &str, company: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(company.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn mentions_remote(location: &str) -> bool {
    static RE_REMOTE: OnceCell<Option<Regex>> = OnceCell::new();
    RE_REMOTE
        .get_or_init(|| Regex::new(r"(?i)\bremote\b").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(location))
}

/// Best-effort timestamp parsing; unknown formats become `None`.
pub fn parse_pub_date(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            // millisecond epochs show up on some boards
            let secs = if secs > 100_000_000_000 { secs / 1000 } else { secs };
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return d.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
            }
            s.parse::<i64>()
                .ok()
                .and_then(|secs| parse_pub_date(&Value::from(secs)))
        }
        _ => None,
    }
}

fn default_mapping(raw: &RawRecord, source: &str) -> CanonicalJob {
    CanonicalJob {
        source: source.to_string(),
        title: raw.str_of(TITLE_KEYS),
        company: raw.str_of(COMPANY_KEYS),
        url: raw.str_of(URL_KEYS),
        description: raw.str_of(DESCRIPTION_KEYS),
        job_type: raw.str_of(JOB_TYPE_KEYS),
        job_industry: raw.str_of(INDUSTRY_KEYS),
        location: raw_location(raw),
        remote: false,
        job_category: JobCategory::Unclassified,
        pub_date: raw.first_of(PUB_DATE_KEYS).and_then(parse_pub_date),
        dedup_key: String::new(),
    }
}

fn nested_display_name(raw: &RawRecord, key: &str) -> String {
    raw.object_at(key)
        .and_then(|m| m.get("display_name"))
        .map(value_to_string)
        .unwrap_or_default()
}

fn apply_override(job: &mut CanonicalJob, raw: &RawRecord, ov: SourceOverride) {
    match ov {
        SourceOverride::Default => {}
        SourceOverride::Adzuna => {
            let company = nested_display_name(raw, "company");
            if !company.is_empty() {
                job.company = company;
            }
            let location = nested_display_name(raw, "location");
            if !location.is_empty() {
                job.location = location;
            }
            let redirect = raw.str_of(&["redirect_url"]);
            if !redirect.is_empty() {
                job.url = redirect;
            }
        }
        SourceOverride::OpenWebNinja => {
            let parts: Vec<String> = ["job_city", "job_state", "job_country"]
                .iter()
                .map(|k| raw.str_of(&[*k]))
                .filter(|s| !s.is_empty())
                .collect();
            if !parts.is_empty() {
                job.location = parts.join(", ");
            }
        }
    }
}

/// A record mapped to its published shape, before classification. The
/// classifier reads the same fields the snapshot will carry.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub job: CanonicalJob,
    /// Explicit remote flag from the raw record, if any.
    pub remote_flag: Option<bool>,
}

impl MappedRecord {
    pub fn into_job(mut self, category: JobCategory) -> CanonicalJob {
        self.job.job_category = category;
        self.job
    }
}

/// Default aliases, then the per-source override. Category is left
/// `Unclassified`.
pub fn map_record(raw: &RawRecord, source: &str) -> MappedRecord {
    let mut job = default_mapping(raw, source);
    apply_override(&mut job, raw, SourceOverride::for_source(source));
    let flag = remote_flag(raw);
    job.remote = flag.unwrap_or_else(|| mentions_remote(&job.location));
    job.dedup_key = fingerprint(&job.title, &job.company, &job.url);
    MappedRecord {
        job,
        remote_flag: flag,
    }
}

/// Map a record whose category is already decided.
pub fn normalize_classified(raw: &RawRecord, source: &str, category: JobCategory) -> CanonicalJob {
    map_record(raw, source).into_job(category)
}

/// Map a record and let the classifier decide its category.
pub fn normalize(raw: &RawRecord, source: &str, classifier: &RelevanceClassifier) -> CanonicalJob {
    let mapped = map_record(raw, source);
    let category = classifier.classify_mapped(&mapped).category;
    mapped.into_job(category)
}
