// tests/classify_keywords.rs
//
// Hand-picked records for the relevance gate: category assignment and the
// word-boundary / negation edge cases.

use ksa_jobs::ingest::types::{JobCategory, RawRecord};
use ksa_jobs::relevance::RelevanceClassifier;
use serde_json::json;

fn clf() -> RelevanceClassifier {
    RelevanceClassifier::with_defaults().expect("default keywords compile")
}

fn category(v: serde_json::Value) -> JobCategory {
    let raw = RawRecord::from_value(v).expect("object");
    clf().classify(&raw).category
}

#[test]
fn onsite_in_the_kingdom_is_regional() {
    assert_eq!(
        category(json!({"title": "Accountant", "location": "Riyadh, Saudi Arabia"})),
        JobCategory::OnSiteRegional
    );
    assert_eq!(
        category(json!({"title": "Site Engineer", "job_location": "Jeddah"})),
        JobCategory::OnSiteRegional
    );
}

#[test]
fn remote_worldwide_is_remote() {
    assert_eq!(
        category(json!({"title": "Backend Dev", "location": "Remote - Worldwide"})),
        JobCategory::Remote
    );
    // Remote beats a target location when both are present.
    assert_eq!(
        category(json!({"title": "Support", "location": "Remote (Riyadh preferred)"})),
        JobCategory::Remote
    );
}

#[test]
fn elsewhere_on_site_is_rejected() {
    let c = clf();
    let raw = RawRecord::from_value(json!({"title": "Barista", "location": "Berlin, Germany"}))
        .expect("object");
    let out = c.classify(&raw);
    assert!(!out.kept());
    assert_eq!(out.category, JobCategory::Unclassified);
}

#[test]
fn arkansas_is_not_ksa() {
    assert_eq!(
        category(json!({"title": "Nurse", "location": "Little Rock, Arkansas, USA"})),
        JobCategory::Unclassified
    );
}

#[test]
fn negated_country_is_not_a_target() {
    assert_eq!(
        category(json!({"title": "Analyst", "location": "Dubai (not saudi based)"})),
        JobCategory::Unclassified
    );
}

#[test]
fn remote_signal_from_title_type_or_description() {
    assert_eq!(
        category(json!({"title": "Remote Designer", "location": "Berlin"})),
        JobCategory::Remote
    );
    assert_eq!(
        category(json!({"title": "Designer", "job_type": "Remote / Full-time", "location": ""})),
        JobCategory::Remote
    );
    assert_eq!(
        category(json!({"title": "Designer", "description": "We are a distributed team."})),
        JobCategory::Remote
    );
}

#[test]
fn explicit_boolean_flags_from_any_alias() {
    assert_eq!(
        category(json!({"title": "QA", "job_is_remote": true, "job_country": "US"})),
        JobCategory::Remote
    );
    assert_eq!(
        category(json!({"title": "QA", "is_remote": "false", "location": "Lisbon"})),
        JobCategory::Unclassified
    );
}

#[test]
fn category_field_is_not_a_remote_signal() {
    // `category` is extracted but not scanned.
    assert_eq!(
        category(json!({"title": "Writer", "category": "Remote Content", "location": "Paris"})),
        JobCategory::Unclassified
    );
}
