// src/relevance.rs
//! Relevance gate for job records: keeps postings a KSA resident can take
//! (remote anywhere, or on-site in the Kingdom) and tags their category.
//!
//! All keyword sets are compiled once into word-boundary regexes. A keyword
//! directly preceded by a negation ("not saudi based", "non-remote") does not
//! count as a hit.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::ingest::normalize::{map_record, MappedRecord};
use crate::ingest::types::{JobCategory, RawRecord};

pub const DEFAULT_CLASSIFIER_CONFIG_PATH: &str = "config/classifier.toml";
pub const ENV_CLASSIFIER_CONFIG_PATH: &str = "CLASSIFIER_CONFIG_PATH";

/// Only the head of the description is scanned.
pub const DESCRIPTION_SCAN_CHARS: usize = 500;

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct KeywordConfig {
    #[serde(default = "default_remote")]
    pub remote: Vec<String>,
    #[serde(default = "default_target_country")]
    pub target_country: Vec<String>,
    #[serde(default = "default_target_region")]
    pub target_region: Vec<String>,
    #[serde(default = "default_negations")]
    pub negations: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_remote() -> Vec<String> {
    strings(&[
        "remote",
        "worldwide",
        "anywhere",
        "global",
        "work from home",
        "wfh",
        "telecommute",
        "distributed",
    ])
}

fn default_target_country() -> Vec<String> {
    strings(&["saudi", "saudi arabia", "ksa", "kingdom of saudi arabia"])
}

fn default_target_region() -> Vec<String> {
    strings(&[
        "riyadh", "jeddah", "dammam", "khobar", "al khobar", "mecca", "makkah", "medina",
        "madinah", "dhahran", "tabuk", "neom",
    ])
}

fn default_negations() -> Vec<String> {
    strings(&["not", "no", "non", "outside", "outside of", "except", "excluding"])
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            target_country: default_target_country(),
            target_region: default_target_region(),
            negations: default_negations(),
        }
    }
}

/* ----------------------------
Compiled keyword sets
---------------------------- */

/// Alternation of escaped phrases; inner whitespace matches any run of
/// whitespace. Longer phrases first so "saudi arabia" wins over "saudi".
fn phrase_alternation(words: &[String]) -> Option<String> {
    let mut phrases: Vec<String> = words
        .iter()
        .map(|w| {
            w.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|p| !p.is_empty())
        .collect();
    if phrases.is_empty() {
        return None;
    }
    phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    phrases.dedup();
    Some(phrases.join("|"))
}

#[derive(Debug)]
struct KeywordSet {
    re: Option<Regex>,
}

impl KeywordSet {
    fn compile(id: &str, words: &[String], negations: &[String]) -> Result<Self> {
        let Some(kw) = phrase_alternation(words) else {
            return Ok(Self { re: None });
        };
        let pattern = match phrase_alternation(negations) {
            Some(neg) => format!(r"(?i)(?:\b(?P<neg>{neg})[\s\-]+)?\b(?P<kw>{kw})\b"),
            None => format!(r"(?i)\b(?P<kw>{kw})\b"),
        };
        let re = Regex::new(&pattern).map_err(|e| anyhow!("keyword set `{id}` regex error: {e}"))?;
        Ok(Self { re: Some(re) })
    }

    /// True if any occurrence is not negated.
    fn hit(&self, text: &str) -> bool {
        let Some(re) = &self.re else {
            return false;
        };
        if text.is_empty() {
            return false;
        }
        re.captures_iter(text).any(|c| c.name("neg").is_none())
    }
}

/* ----------------------------
Field extraction
---------------------------- */

/// The text fields the gate looks at, taken from the mapped record so the
/// decision is made on exactly what gets published.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    pub remote_flag: Option<bool>,
    pub location: String,
    pub job_type: String,
    pub title: String,
    /// Extracted for diagnostics; never scanned.
    pub category: String,
    /// Already cut to `DESCRIPTION_SCAN_CHARS`.
    pub description: String,
}

impl Signals {
    pub fn of(mapped: &MappedRecord) -> Self {
        let job = &mapped.job;
        Self {
            remote_flag: mapped.remote_flag,
            location: job.location.clone(),
            job_type: job.job_type.clone(),
            title: job.title.clone(),
            category: job.job_industry.clone(),
            description: job.description.chars().take(DESCRIPTION_SCAN_CHARS).collect(),
        }
    }
}

/* ----------------------------
Classifier
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub remote: bool,
    pub target_location: bool,
    pub category: JobCategory,
}

impl Classification {
    pub fn rejected() -> Self {
        Self {
            remote: false,
            target_location: false,
            category: JobCategory::Unclassified,
        }
    }

    pub fn kept(&self) -> bool {
        self.remote || self.target_location
    }
}

#[derive(Debug)]
pub struct RelevanceClassifier {
    pub cfg: KeywordConfig,
    remote: KeywordSet,
    country: KeywordSet,
    region: KeywordSet,
}

impl RelevanceClassifier {
    pub fn new(cfg: KeywordConfig) -> Result<Self> {
        let remote = KeywordSet::compile("remote", &cfg.remote, &cfg.negations)?;
        let country = KeywordSet::compile("target_country", &cfg.target_country, &cfg.negations)?;
        let region = KeywordSet::compile("target_region", &cfg.target_region, &cfg.negations)?;
        Ok(Self {
            cfg,
            remote,
            country,
            region,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(KeywordConfig::default())
    }

    /// Load from a TOML string; missing sections fall back to the defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: KeywordConfig = toml::from_str(s).context("parsing classifier keywords")?;
        Self::new(cfg)
    }

    /// $CLASSIFIER_CONFIG_PATH (must exist), else config/classifier.toml if
    /// present, else built-in keywords.
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CLASSIFIER_CONFIG_PATH) {
            let path = PathBuf::from(p);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading classifier config {}", path.display()))?;
            return Self::from_toml_str(&content);
        }
        let default_path = PathBuf::from(DEFAULT_CLASSIFIER_CONFIG_PATH);
        if default_path.exists() {
            let content = fs::read_to_string(&default_path)
                .with_context(|| format!("reading classifier config {}", default_path.display()))?;
            return Self::from_toml_str(&content);
        }
        Self::with_defaults()
    }

    pub fn is_remote_text(&self, text: &str) -> bool {
        self.remote.hit(text)
    }

    pub fn is_target_location(&self, location: &str) -> bool {
        self.country.hit(location) || self.region.hit(location)
    }

    pub fn classify_signals(&self, s: &Signals) -> Classification {
        let remote = s.remote_flag == Some(true)
            || [&s.location, &s.job_type, &s.title, &s.description]
                .iter()
                .any(|t| self.is_remote_text(t));

        let target_location = !remote && self.is_target_location(&s.location);

        let category = if remote {
            JobCategory::Remote
        } else if target_location {
            JobCategory::OnSiteRegional
        } else {
            JobCategory::Unclassified
        };

        Classification {
            remote,
            target_location,
            category,
        }
    }

    pub fn classify_mapped(&self, mapped: &MappedRecord) -> Classification {
        let signals = Signals::of(mapped);
        let out = self.classify_signals(&signals);
        if !out.kept() {
            tracing::trace!(target: "relevance", ?signals, "record rejected");
        }
        out
    }

    /// Classify as `source` would publish it (source-specific overrides apply).
    pub fn classify_from(&self, raw: &RawRecord, source: &str) -> Classification {
        self.classify_mapped(&map_record(raw, source))
    }

    /// Classify with the default field mapping only.
    pub fn classify(&self, raw: &RawRecord) -> Classification {
        self.classify_from(raw, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn clf() -> RelevanceClassifier {
        RelevanceClassifier::with_defaults().expect("default keywords compile")
    }

    fn rec(v: Value) -> RawRecord {
        RawRecord::from_value(v).unwrap()
    }

    #[test]
    fn word_boundaries_not_substrings() {
        let c = clf();
        assert!(!c.is_target_location("Arkansas, USA"));
        assert!(c.is_target_location("Office: KSA"));
        assert!(!c.is_remote_text("Remoteness allowance"));
        assert!(!c.is_target_location("Saudia Airlines lounge, Cairo"));
    }

    #[test]
    fn negated_keywords_do_not_count() {
        let c = clf();
        assert!(!c.is_target_location("not saudi based"));
        assert!(!c.is_remote_text("Non-remote role"));
        assert!(!c.is_remote_text("no remote work"));
        assert!(!c.is_target_location("anywhere outside of Saudi Arabia"));
        assert!(c.is_target_location("KSA, not Dubai"));
    }

    #[test]
    fn multiword_phrases_tolerate_whitespace() {
        let c = clf();
        assert!(c.is_remote_text("Work  from\thome possible"));
        assert!(c.is_target_location("Al  Khobar"));
    }

    #[test]
    fn explicit_flag_wins_over_text() {
        let c = clf();
        let r = rec(json!({"remote": "true", "location": "Berlin, Germany"}));
        assert_eq!(c.classify(&r).category, JobCategory::Remote);
        let r = rec(json!({"remote": false, "location": "Remote - Worldwide"}));
        assert_eq!(c.classify(&r).category, JobCategory::Remote);
    }

    #[test]
    fn source_overrides_shape_the_location_that_is_judged() {
        let c = clf();
        let r = rec(json!({"job_city": "Riyadh", "job_country": "SA", "job_is_remote": false}));
        assert!(!c.classify(&r).kept());
        let verdict = c.classify_from(&r, crate::ingest::providers::OPENWEBNINJA);
        assert_eq!(verdict.category, JobCategory::OnSiteRegional);
    }

    #[test]
    fn description_scan_is_bounded() {
        let c = clf();
        let long = format!("{} remote", "x".repeat(DESCRIPTION_SCAN_CHARS));
        let r = rec(json!({"location": "Berlin", "description": long}));
        assert!(!c.classify(&r).kept());
        let short = rec(json!({"location": "Berlin", "description": "Fully remote team"}));
        assert!(c.classify(&short).kept());
    }

    #[test]
    fn toml_overrides_keep_missing_sections() {
        let c = RelevanceClassifier::from_toml_str(r#"target_region = ["abha"]"#).unwrap();
        assert!(c.is_target_location("Abha"));
        assert!(!c.is_target_location("Riyadh"));
        assert!(c.is_target_location("Saudi Arabia"));
        assert_eq!(c.cfg.remote, default_remote());
    }

    #[test]
    fn empty_sets_never_match() {
        let cfg = KeywordConfig {
            remote: vec![],
            ..KeywordConfig::default()
        };
        let c = RelevanceClassifier::new(cfg).unwrap();
        assert!(!c.is_remote_text("remote"));
    }
}
