// tests/snapshot_publish.rs
//
// Publication is a whole-collection swap: readers see the old snapshot or
// the new one, and a failed cycle leaves the old one in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use ksa_jobs::ingest::scheduler::Scheduler;
use ksa_jobs::ingest::snapshot::{Snapshot, SnapshotStore};
use ksa_jobs::ingest::types::{CanonicalJob, FetchOutcome, JobCategory, SourceProvider};
use ksa_jobs::ingest::Pipeline;
use ksa_jobs::relevance::RelevanceClassifier;

/// Returns `n` remote jobs, or fails when `broken` is set.
struct Switchable {
    n: usize,
    broken: AtomicBool,
}

#[async_trait]
impl SourceProvider for Switchable {
    async fn fetch(&self) -> FetchOutcome {
        if self.broken.load(Ordering::SeqCst) {
            return FetchOutcome::Failed("timeout".into());
        }
        let items: Vec<Value> = (0..self.n)
            .map(|i| json!({"title": format!("Job {i}"), "company": "Acme", "url": format!("https://acme.test/{i}"), "location": "Remote"}))
            .collect();
        FetchOutcome::Fetched(items)
    }
    fn name(&self) -> &str {
        "switchable"
    }
}

fn scheduler(src: Arc<Switchable>) -> Arc<Scheduler> {
    let clf = RelevanceClassifier::with_defaults().expect("default keywords compile");
    let sources: Vec<Arc<dyn SourceProvider>> = vec![src];
    let pipeline = Arc::new(Pipeline::new(sources, Arc::new(clf)));
    Scheduler::new(pipeline, SnapshotStore::new())
}

fn job(i: usize) -> CanonicalJob {
    CanonicalJob {
        source: "t".into(),
        title: format!("J{i}"),
        company: "C".into(),
        url: format!("u{i}"),
        description: String::new(),
        job_type: String::new(),
        job_industry: String::new(),
        location: "Remote".into(),
        remote: true,
        job_category: JobCategory::Remote,
        pub_date: None,
        dedup_key: format!("k{i}"),
    }
}

#[tokio::test]
async fn failed_cycle_keeps_previous_snapshot() {
    let src = Arc::new(Switchable {
        n: 3,
        broken: AtomicBool::new(false),
    });
    let sched = scheduler(Arc::clone(&src));

    sched.refresh().await.expect("first cycle");
    let first = sched.snapshot();
    assert_eq!(first.len(), 3);

    src.broken.store(true, Ordering::SeqCst);
    assert!(sched.refresh().await.is_err());

    let after = sched.snapshot();
    assert!(Arc::ptr_eq(&first, &after), "snapshot must be untouched");
}

#[tokio::test]
async fn boot_snapshot_is_empty_until_first_success() {
    let src = Arc::new(Switchable {
        n: 1,
        broken: AtomicBool::new(true),
    });
    let sched = scheduler(src);
    let _ = sched.refresh().await;
    assert!(sched.snapshot().is_empty());
    assert!(sched.snapshot().generated_at.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_only_see_whole_snapshots() {
    let store = SnapshotStore::new();
    // Cycle k always carries exactly k jobs; any other length is torn.
    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for k in 1..=200usize {
                store.publish(Snapshot::new(k as u64, (0..k).map(job).collect()));
                tokio::task::yield_now().await;
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    let s = store.current();
                    assert_eq!(s.len() as u64, s.cycle);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.expect("writer");
    for r in readers {
        r.await.expect("reader saw a torn snapshot");
    }
    assert_eq!(store.current().cycle, 200);
}
