// src/ingest/mod.rs
pub mod fields;
pub mod http;
pub mod normalize;
pub mod providers;
pub mod scheduler;
pub mod snapshot;
pub mod types;

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::ingest::normalize::{fingerprint, map_record};
use crate::ingest::types::{CanonicalJob, FetchOutcome, ItemError, RawRecord, SourceProvider};
use crate::relevance::RelevanceClassifier;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_raw_total", "Raw records returned by sources.");
        describe_counter!(
            "ingest_kept_total",
            "Records kept per source after relevance filtering, before dedup."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Records removed as cross-source duplicates."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetches that failed after retries or returned malformed data."
        );
        describe_counter!(
            "ingest_item_errors_total",
            "Single records skipped because they could not be processed."
        );
        describe_counter!("ingest_cycles_total", "Refresh cycles started.");
        describe_counter!(
            "ingest_cycle_failures_total",
            "Refresh cycles that left the previous snapshot in place."
        );
        describe_histogram!(
            "ingest_source_fetch_ms",
            "Per-source fetch + filter time in milliseconds."
        );
        describe_gauge!("snapshot_jobs", "Jobs in the currently published snapshot.");
        describe_gauge!(
            "snapshot_published_ts",
            "Unix ts of the last snapshot publication."
        );
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Fetched,
    Disabled,
    Failed,
    /// The source task panicked; siblings were unaffected.
    Crashed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub name: String,
    pub status: SourceStatus,
    pub raw: usize,
    pub kept: usize,
    pub item_errors: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub jobs: Vec<CanonicalJob>,
    pub sources: Vec<SourceStats>,
    pub duplicates: usize,
}

impl CycleReport {
    pub fn stats_for(&self, name: &str) -> Option<&SourceStats> {
        self.sources.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("all {failed} enabled sources failed; keeping previous snapshot")]
    AllSourcesFailed { failed: usize },
}

/// Map one raw item to its published shape, classify that shape and keep it
/// if relevant. Panics inside are contained and reported as an item error.
pub fn process_item(
    source: &str,
    item: Value,
    classifier: &RelevanceClassifier,
) -> Result<Option<CanonicalJob>, ItemError> {
    let raw = RawRecord::from_value(item)?;
    catch_unwind(AssertUnwindSafe(|| {
        let mapped = map_record(&raw, source);
        let verdict = classifier.classify_mapped(&mapped);
        verdict.kept().then(|| mapped.into_job(verdict.category))
    }))
    .map_err(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ItemError::Panicked(msg)
    })
}

/// Run every item of one source through the gate, preserving order.
/// Returns (kept, item_errors).
pub fn process_items(
    source: &str,
    items: Vec<Value>,
    classifier: &RelevanceClassifier,
) -> (Vec<CanonicalJob>, usize) {
    let mut kept = Vec::new();
    let mut errors = 0usize;
    for (idx, item) in items.into_iter().enumerate() {
        match process_item(source, item, classifier) {
            Ok(Some(job)) => kept.push(job),
            Ok(None) => {}
            Err(e) => {
                errors += 1;
                warn!(target: "ingest", source, index = idx, error = %e, "skipping record");
            }
        }
    }
    if errors > 0 {
        counter!("ingest_item_errors_total").increment(errors as u64);
    }
    (kept, errors)
}

/// Keep the first job per fingerprint, in order. Returns (unique, removed).
pub fn dedup_jobs(jobs: Vec<CanonicalJob>) -> (Vec<CanonicalJob>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(jobs.len());
    let mut keep = Vec::with_capacity(jobs.len());
    let mut removed = 0usize;
    for mut job in jobs {
        let key = fingerprint(&job.title, &job.company, &job.url);
        if !seen.insert(key.clone()) {
            removed += 1;
            continue;
        }
        job.dedup_key = key;
        keep.push(job);
    }
    (keep, removed)
}

async fn run_source(
    source: Arc<dyn SourceProvider>,
    classifier: Arc<RelevanceClassifier>,
) -> (SourceStats, Vec<CanonicalJob>) {
    let t0 = Instant::now();
    let name = source.name().to_string();

    let (status, items) = match source.fetch().await {
        FetchOutcome::Fetched(items) => (SourceStatus::Fetched, items),
        FetchOutcome::Disabled(_) => (SourceStatus::Disabled, Vec::new()),
        FetchOutcome::Failed(_) => (SourceStatus::Failed, Vec::new()),
    };
    let raw = items.len();
    let (kept, item_errors) = process_items(&name, items, &classifier);

    let elapsed_ms = t0.elapsed().as_millis() as u64;
    histogram!("ingest_source_fetch_ms", "source" => name.clone()).record(elapsed_ms as f64);
    counter!("ingest_raw_total").increment(raw as u64);
    counter!("ingest_kept_total").increment(kept.len() as u64);

    info!(
        target: "ingest",
        source = %name,
        raw,
        kept = kept.len(),
        item_errors,
        elapsed_ms,
        "source processed"
    );

    let stats = SourceStats {
        name,
        status,
        raw,
        kept: kept.len(),
        item_errors,
        elapsed_ms,
    };
    (stats, kept)
}

/// Fetch orchestrator: all sources concurrently, one task each.
pub struct Pipeline {
    sources: Vec<Arc<dyn SourceProvider>>,
    classifier: Arc<RelevanceClassifier>,
}

impl Pipeline {
    pub fn new(sources: Vec<Arc<dyn SourceProvider>>, classifier: Arc<RelevanceClassifier>) -> Self {
        Self {
            sources,
            classifier,
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// One full fetch → classify → normalize → dedup pass. Results are
    /// flattened in launch order; a panicking source task only loses its own
    /// contribution.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        ensure_metrics_described();

        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|s| {
                let name = s.name().to_string();
                let task = tokio::spawn(run_source(Arc::clone(s), Arc::clone(&self.classifier)));
                (name, s.enabled(), task)
            })
            .collect();

        let mut sources = Vec::with_capacity(handles.len());
        let mut flattened = Vec::new();
        let mut enabled = 0usize;
        let mut failed = 0usize;

        for (name, is_enabled, task) in handles {
            let (stats, kept) = match task.await {
                Ok(done) => done,
                Err(e) => {
                    warn!(target: "ingest", source = %name, error = %e, "source task crashed");
                    counter!("ingest_source_errors_total", "source" => name.clone()).increment(1);
                    let stats = SourceStats {
                        name,
                        status: SourceStatus::Crashed,
                        raw: 0,
                        kept: 0,
                        item_errors: 0,
                        elapsed_ms: 0,
                    };
                    (stats, Vec::new())
                }
            };
            if is_enabled {
                enabled += 1;
                if matches!(stats.status, SourceStatus::Failed | SourceStatus::Crashed) {
                    failed += 1;
                }
            }
            flattened.extend(kept);
            sources.push(stats);
        }

        if enabled > 0 && failed == enabled {
            return Err(CycleError::AllSourcesFailed { failed });
        }

        let (jobs, duplicates) = dedup_jobs(flattened);
        counter!("ingest_dedup_total").increment(duplicates as u64);

        info!(target: "ingest", unique = jobs.len(), duplicates, "cycle merged");

        Ok(CycleReport {
            jobs,
            sources,
            duplicates,
        })
    }
}
