// tests/settings_env.rs
//
// Environment-driven configuration. These tests mutate process env vars,
// so they run serially.

use std::env;
use std::fs;

use serial_test::serial;

use ksa_jobs::config::Settings;
use ksa_jobs::relevance::{RelevanceClassifier, ENV_CLASSIFIER_CONFIG_PATH};

const VARS: &[&str] = &[
    "APP_PORT",
    "MAX_RETRIES",
    "REFRESH_INTERVAL_SECS",
    "JOOBLE_KEY",
    "AI_SERVICE_URL",
    ENV_CLASSIFIER_CONFIG_PATH,
];

fn clear() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[test]
#[serial]
fn settings_read_from_process_env() {
    clear();
    env::set_var("APP_PORT", "8088");
    env::set_var("MAX_RETRIES", "5");
    env::set_var("REFRESH_INTERVAL_SECS", "600");
    env::set_var("JOOBLE_KEY", " live-key ");
    env::set_var("AI_SERVICE_URL", "http://127.0.0.1:9000/search");

    let s = Settings::from_env();
    assert_eq!(s.app_port, 8088);
    assert_eq!(s.max_retries, 5);
    assert_eq!(s.http_client_cfg().retry.max_attempts, 5);
    assert_eq!(s.scheduler_cfg().interval.as_secs(), 600);
    assert_eq!(s.jooble_key.as_deref(), Some("live-key"));
    assert!(s.ai.enabled());
    clear();
}

#[test]
#[serial]
fn classifier_loads_keywords_from_configured_path() {
    clear();
    let path = env::temp_dir().join(format!("ksa-jobs-classifier-{}.toml", std::process::id()));
    fs::write(&path, "target_region = [\"abha\", \"najran\"]\n").expect("write temp config");
    env::set_var(ENV_CLASSIFIER_CONFIG_PATH, &path);

    let c = RelevanceClassifier::load().expect("load from env path");
    assert!(c.is_target_location("Najran"));
    assert!(!c.is_target_location("Riyadh"));

    let _ = fs::remove_file(&path);
    clear();
}

#[test]
#[serial]
fn classifier_path_that_does_not_exist_is_an_error() {
    clear();
    env::set_var(ENV_CLASSIFIER_CONFIG_PATH, "/definitely/not/here.toml");
    assert!(RelevanceClassifier::load().is_err());
    clear();
}
