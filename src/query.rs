// src/query.rs
//! Read-side helpers over a published snapshot: filtering, paging, and the
//! aggregate counts served next to every job listing.

use std::collections::HashMap;

use serde::Serialize;

use crate::ingest::types::CanonicalJob;

pub const MAX_PAGE_SIZE: usize = 100;
pub const TOP_N: usize = 50;
const UNKNOWN: &str = "Unknown";

/// Case-insensitive substring filters; `None`/blank means "any".
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub keyword: Option<String>,
    pub job_type: Option<String>,
    pub industry: Option<String>,
}

fn needle(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains(hay: &str, needle: &str) -> bool {
    hay.to_lowercase().contains(needle)
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        needle(&self.keyword).is_none()
            && needle(&self.job_type).is_none()
            && needle(&self.industry).is_none()
    }

    pub fn matches(&self, job: &CanonicalJob) -> bool {
        if let Some(k) = needle(&self.keyword) {
            let hit = contains(&job.title, &k)
                || contains(&job.company, &k)
                || contains(&job.description, &k)
                || contains(&job.location, &k);
            if !hit {
                return false;
            }
        }
        if let Some(t) = needle(&self.job_type) {
            if !contains(&job.job_type, &t) {
                return false;
            }
        }
        if let Some(i) = needle(&self.industry) {
            if !contains(&job.job_industry, &i) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, jobs: impl IntoIterator<Item = &'a CanonicalJob>) -> Vec<&'a CanonicalJob> {
        jobs.into_iter().filter(|j| self.matches(j)).collect()
    }
}

/// 1-based page of `items`. Out-of-range pages are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    let page = page.max(1);
    let size = page_size.clamp(1, MAX_PAGE_SIZE);
    let start = (page - 1).saturating_mul(size);
    items.iter().skip(start).take(size).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub total_jobs: usize,
    pub by_company: Vec<Bucket>,
    pub by_job_type: Vec<Bucket>,
    pub by_location: Vec<Bucket>,
}

fn top_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<Bucket> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        let v = v.trim();
        *counts.entry(if v.is_empty() { UNKNOWN } else { v }).or_default() += 1;
    }
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(name, count)| Bucket {
            name: name.to_string(),
            count,
        })
        .collect();
    // Highest count first; ties by name so output is stable.
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    buckets.truncate(TOP_N);
    buckets
}

pub fn compute_stats(jobs: &[&CanonicalJob]) -> JobStats {
    JobStats {
        total_jobs: jobs.len(),
        by_company: top_counts(jobs.iter().map(|j| j.company.as_str())),
        by_job_type: top_counts(jobs.iter().map(|j| j.job_type.as_str())),
        by_location: top_counts(jobs.iter().map(|j| j.location.as_str())),
    }
}
