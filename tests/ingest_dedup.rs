// tests/ingest_dedup.rs
use ksa_jobs::ingest::dedup_jobs;
use ksa_jobs::ingest::normalize::fingerprint;
use ksa_jobs::ingest::types::{CanonicalJob, JobCategory};

fn job(source: &str, title: &str, company: &str, url: &str) -> CanonicalJob {
    CanonicalJob {
        source: source.into(),
        title: title.into(),
        company: company.into(),
        url: url.into(),
        description: String::new(),
        job_type: String::new(),
        job_industry: String::new(),
        location: "Remote".into(),
        remote: true,
        job_category: JobCategory::Remote,
        pub_date: None,
        dedup_key: String::new(),
    }
}

#[test]
fn fingerprint_is_stable_and_field_sensitive() {
    let a = fingerprint("Rust Dev", "Acme", "https://a.test/1");
    assert_eq!(a, fingerprint("Rust Dev", "Acme", "https://a.test/1"));
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, fingerprint("Rust Dev", "Acme Inc", "https://a.test/1"));
    // The separator keeps field boundaries apart.
    assert_ne!(fingerprint("ab", "c", ""), fingerprint("a", "bc", ""));
}

#[test]
fn first_seen_survives_across_sources() {
    let jobs = vec![
        job("arbeitnow", "Dev", "Acme", "u1"),
        job("remotive", "QA", "Beta", "u2"),
        job("jobicy", "Dev", "Acme", "u1"),
        job("remotive", "Dev", "Acme", "u3"),
    ];
    let (out, removed) = dedup_jobs(jobs);
    assert_eq!(removed, 1);
    let pairs: Vec<_> = out.iter().map(|j| (j.source.as_str(), j.url.as_str())).collect();
    assert_eq!(pairs, vec![("arbeitnow", "u1"), ("remotive", "u2"), ("remotive", "u3")]);
    assert!(out.iter().all(|j| j.dedup_key == fingerprint(&j.title, &j.company, &j.url)));
}

#[test]
fn dedup_is_idempotent() {
    let jobs = vec![
        job("a", "Dev", "Acme", "u1"),
        job("b", "Dev", "Acme", "u1"),
        job("c", "Ops", "Acme", "u9"),
    ];
    let (once, _) = dedup_jobs(jobs);
    let (twice, removed) = dedup_jobs(once.clone());
    assert_eq!(removed, 0);
    assert_eq!(once, twice);
}
