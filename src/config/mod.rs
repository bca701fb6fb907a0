// src/config/mod.rs
//! Process settings from the environment (`.env` is loaded by the binary).
//! Unparseable numbers fall back to defaults; blank strings count as unset.

pub mod ai;

use std::time::Duration;

use crate::ingest::http::{HttpClientCfg, RetryPolicy};
use crate::ingest::scheduler::IngestSchedulerCfg;

pub const DEFAULT_PORT: u16 = 7070;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub app_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub page_size: usize,
    pub refresh_interval_secs: u64,
    pub debug_mode: bool,
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub jooble_key: Option<String>,
    pub careerjet_key: Option<String>,
    pub openwebninja_key: Option<String>,
    pub ai: ai::AiSearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_bool(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| {
            lookup(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let num = |k: &str| get(k).and_then(|v| v.parse::<u64>().ok());

        Self {
            app_port: get("APP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            log_level: get("RUST_LOG")
                .or_else(|| get("LOG_LEVEL").map(|l| l.to_ascii_lowercase()))
                .unwrap_or_else(|| "info".to_string()),
            log_json: get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            max_retries: num("MAX_RETRIES")
                .map(|n| n.clamp(1, 10) as u32)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            timeout_secs: num("HTTP_TIMEOUT_SECS")
                .or_else(|| num("TIMEOUT"))
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            page_size: num("PAGE_SIZE")
                .map(|n| (n as usize).clamp(1, 100))
                .unwrap_or(DEFAULT_PAGE_SIZE),
            refresh_interval_secs: num("REFRESH_INTERVAL_SECS")
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            debug_mode: parse_bool(get("DEBUG_MODE")),
            adzuna_app_id: get("ADZUNA_APP_ID"),
            adzuna_app_key: get("ADZUNA_APP_KEY"),
            jooble_key: get("JOOBLE_KEY"),
            careerjet_key: get("CAREERJET_KEY"),
            openwebninja_key: get("OPENWEBNINJA_KEY"),
            ai: ai::AiSearchConfig {
                service_url: get("AI_SERVICE_URL"),
            },
        }
    }

    pub fn http_client_cfg(&self) -> HttpClientCfg {
        HttpClientCfg {
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy::with_max_attempts(self.max_retries),
            ..HttpClientCfg::default()
        }
    }

    pub fn scheduler_cfg(&self) -> IngestSchedulerCfg {
        IngestSchedulerCfg {
            interval: Duration::from_secs(self.refresh_interval_secs),
        }
    }
}
