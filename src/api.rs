use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::ai_search::{resolve, DynAiSearch};
use crate::ingest::scheduler::Scheduler;
use crate::ingest::types::CanonicalJob;
use crate::query::{compute_stats, paginate, JobFilter, JobStats, MAX_PAGE_SIZE};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub ai: DynAiSearch,
    pub default_page_size: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs", get(list_jobs))
        .route("/admin/refresh", post(admin_refresh))
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A panicking handler answers a JSON 500 instead of dropping the connection.
fn internal_error(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(target: "api", %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsParams {
    pub keyword: Option<String>,
    pub job_type: Option<String>,
    pub industry: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    /// Free-text query for the AI search delegate.
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobsResp {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub jobs: Vec<CanonicalJob>,
    pub stats: JobStats,
    pub ai_powered: bool,
    pub generated_at: Option<DateTime<Utc>>,
}

async fn list_jobs(State(state): State<AppState>, Query(p): Query<JobsParams>) -> Json<JobsResp> {
    let snapshot = state.scheduler.snapshot();
    let filter = JobFilter {
        keyword: p.keyword,
        job_type: p.job_type,
        industry: p.industry,
    };

    // AI ranking when it produced anything, the plain snapshot otherwise.
    let ai_query = p.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let ai_jobs = match ai_query {
        Some(q) if state.ai.enabled() => resolve(&snapshot, &state.ai.search(q).await),
        _ => Vec::new(),
    };
    let ai_powered = !ai_jobs.is_empty();
    let base: &[CanonicalJob] = if ai_powered { &ai_jobs } else { &snapshot.jobs };

    let matched = filter.apply(base);
    let stats = compute_stats(&matched);

    let page = p.page.unwrap_or(1).max(1);
    let page_size = p
        .page_size
        .unwrap_or(state.default_page_size)
        .clamp(1, MAX_PAGE_SIZE);
    let jobs: Vec<CanonicalJob> = paginate(&matched, page, page_size)
        .into_iter()
        .cloned()
        .collect();

    Json(JobsResp {
        count: matched.len(),
        page,
        page_size,
        jobs,
        stats,
        ai_powered,
        generated_at: snapshot.generated_at,
    })
}

async fn admin_refresh(State(state): State<AppState>) -> impl IntoResponse {
    info!(target: "ingest", "manual refresh requested");
    let _ = state.scheduler.trigger_refresh();
    (StatusCode::ACCEPTED, Json(json!({ "status": "accepted" })))
}
