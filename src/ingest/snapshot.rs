// src/ingest/snapshot.rs
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::types::CanonicalJob;

/// Result of one completed refresh cycle. Never mutated after publication.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub generated_at: Option<DateTime<Utc>>,
    pub jobs: Vec<CanonicalJob>,
}

impl Snapshot {
    pub fn new(cycle: u64, jobs: Vec<CanonicalJob>) -> Self {
        Self {
            cycle,
            generated_at: Some(Utc::now()),
            jobs,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn find(&self, dedup_key: &str) -> Option<&CanonicalJob> {
        self.jobs.iter().find(|j| j.dedup_key == dedup_key)
    }
}

/// Holder of the current snapshot. Readers clone the `Arc`; publishing swaps
/// the pointer under a short write lock, so a reader sees the old or the new
/// collection and nothing in between.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.inner.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the current snapshot unless a newer cycle already published.
    /// Returns whether `next` became current.
    pub fn publish(&self, next: Snapshot) -> bool {
        let next = Arc::new(next);
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        if next.cycle < guard.cycle {
            return false;
        }
        *guard = next;
        true
    }
}
