// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ai_search;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod query;
pub mod relevance;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::ai_search::build_ai_search;
use crate::config::Settings;
use crate::ingest::http::{HttpClient, JsonTransport};
use crate::ingest::providers::default_sources;
use crate::ingest::scheduler::Scheduler;
use crate::ingest::snapshot::SnapshotStore;
use crate::ingest::Pipeline;
use crate::relevance::RelevanceClassifier;

pub use crate::api::{router, AppState};

/// Everything the process owns: the shared HTTP pool, the scheduler, and
/// the state handed to the router.
pub struct Service {
    pub http: Arc<HttpClient>,
    pub scheduler: Arc<Scheduler>,
    pub state: AppState,
}

impl Service {
    pub fn build(settings: &Settings, classifier: RelevanceClassifier) -> Self {
        let http = Arc::new(HttpClient::new(settings.http_client_cfg()));
        let transport: Arc<dyn JsonTransport> = http.clone();

        let sources = default_sources(settings, Arc::clone(&transport));
        let pipeline = Arc::new(Pipeline::new(sources, Arc::new(classifier)));
        info!(target: "ingest", sources = ?pipeline.source_names(), "pipeline ready");
        let scheduler = Scheduler::new(pipeline, SnapshotStore::new());

        let state = AppState {
            scheduler: Arc::clone(&scheduler),
            ai: build_ai_search(&settings.ai, transport),
            default_page_size: settings.page_size,
        };

        Self {
            http,
            scheduler,
            state,
        }
    }

    /// Start the refresh loop (one immediate cycle, then every interval).
    pub fn start(&self, settings: &Settings, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        self.scheduler.spawn(settings.scheduler_cfg(), shutdown)
    }

    /// Release the connection pool. In-flight and later requests fail fast.
    pub fn close(&self) {
        self.http.close();
    }
}
