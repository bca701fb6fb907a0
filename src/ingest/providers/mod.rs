// src/ingest/providers/mod.rs
//! The job boards we ingest from. Each constructor is a pure description of
//! the request; all I/O goes through the injected transport.

pub mod json_board;

use std::sync::Arc;

use serde_json::json;

use crate::config::Settings;
use crate::ingest::http::{JsonRequest, JsonTransport};
use crate::ingest::types::SourceProvider;
use json_board::{Credential, JsonBoard, ListShape};

pub const ARBEITNOW: &str = "arbeitnow";
pub const JOBICY: &str = "jobicy";
pub const REMOTIVE: &str = "remotive";
pub const ADZUNA: &str = "adzuna";
pub const JOOBLE: &str = "jooble";
pub const CAREERJET: &str = "careerjet";
pub const OPENWEBNINJA: &str = "openwebninja";

/// Sample keys that used to ship in example configs.
const JOOBLE_PLACEHOLDERS: &[&str] = &["bcf720ac"];
const CAREERJET_PLACEHOLDERS: &[&str] = &["6fde6cd"];

const PAGE: u32 = 50;

pub fn arbeitnow(transport: Arc<dyn JsonTransport>) -> JsonBoard {
    JsonBoard::open(
        ARBEITNOW,
        ListShape {
            keys: &["data"],
            bare_list: true,
        },
        JsonRequest::get(ARBEITNOW, "https://www.arbeitnow.com/api/job-board-api"),
        transport,
    )
}

pub fn jobicy(transport: Arc<dyn JsonTransport>) -> JsonBoard {
    JsonBoard::open(
        JOBICY,
        ListShape {
            keys: &["jobs", "data"],
            bare_list: true,
        },
        JsonRequest::get(JOBICY, "https://jobicy.com/api/v2/remote-jobs").query("count", PAGE),
        transport,
    )
}

pub fn remotive(transport: Arc<dyn JsonTransport>) -> JsonBoard {
    JsonBoard::open(
        REMOTIVE,
        ListShape {
            keys: &["jobs"],
            bare_list: false,
        },
        JsonRequest::get(REMOTIVE, "https://remotive.com/api/remote-jobs"),
        transport,
    )
}

pub fn adzuna(
    transport: Arc<dyn JsonTransport>,
    app_id: Option<String>,
    app_key: Option<String>,
) -> JsonBoard {
    JsonBoard::with_credentials(
        ADZUNA,
        ListShape {
            keys: &["results"],
            bare_list: false,
        },
        &[
            Credential::new("ADZUNA_APP_ID", app_id),
            Credential::new("ADZUNA_APP_KEY", app_key),
        ],
        transport,
        |c| {
            JsonRequest::get(ADZUNA, "https://api.adzuna.com/v1/api/jobs/gb/search/1")
                .query("app_id", c[0])
                .query("app_key", c[1])
                .query("results_per_page", PAGE)
                .query("what", "remote")
                .query("where", "worldwide")
        },
    )
}

pub fn jooble(transport: Arc<dyn JsonTransport>, key: Option<String>) -> JsonBoard {
    JsonBoard::with_credentials(
        JOOBLE,
        ListShape {
            keys: &["jobs", "data"],
            bare_list: false,
        },
        &[Credential::new("JOOBLE_KEY", key).with_placeholders(JOOBLE_PLACEHOLDERS)],
        transport,
        |c| {
            JsonRequest::post(
                JOOBLE,
                format!("https://jooble.org/api/{}", c[0]),
                json!({ "keywords": "remote software developer engineer", "location": "" }),
            )
        },
    )
}

pub fn careerjet(transport: Arc<dyn JsonTransport>, affid: Option<String>) -> JsonBoard {
    JsonBoard::with_credentials(
        CAREERJET,
        ListShape {
            keys: &["jobs"],
            bare_list: false,
        },
        &[Credential::new("CAREERJET_KEY", affid).with_placeholders(CAREERJET_PLACEHOLDERS)],
        transport,
        |c| {
            JsonRequest::get(CAREERJET, "http://public.api.careerjet.net/search")
                .query("affid", c[0])
                .query("keywords", "remote")
                .query("location", "")
                .query("pagesize", PAGE)
                .query("user_ip", "127.0.0.1")
                .query("user_agent", "Mozilla/5.0")
        },
    )
}

pub fn openwebninja(transport: Arc<dyn JsonTransport>, key: Option<String>) -> JsonBoard {
    JsonBoard::with_credentials(
        OPENWEBNINJA,
        ListShape {
            keys: &["data", "results", "jobs"],
            bare_list: false,
        },
        &[Credential::new("OPENWEBNINJA_KEY", key)],
        transport,
        |c| {
            JsonRequest::get(OPENWEBNINJA, "https://app.openwebninja.com/api/jsearch/search")
                .header("X-Api-Key", c[0])
                .query("limit", PAGE)
                .query("query", "remote software engineer")
                .query("employment_types", "FULLTIME,PARTTIME,CONTRACTOR")
        },
    )
}

/// All boards in launch order. Credentialed boards are always listed; they
/// report themselves disabled when their keys are unusable.
pub fn default_sources(
    settings: &Settings,
    transport: Arc<dyn JsonTransport>,
) -> Vec<Arc<dyn SourceProvider>> {
    let t = || Arc::clone(&transport);
    vec![
        Arc::new(arbeitnow(t())),
        Arc::new(jobicy(t())),
        Arc::new(remotive(t())),
        Arc::new(adzuna(
            t(),
            settings.adzuna_app_id.clone(),
            settings.adzuna_app_key.clone(),
        )),
        Arc::new(jooble(t(), settings.jooble_key.clone())),
        Arc::new(careerjet(t(), settings.careerjet_key.clone())),
        Arc::new(openwebninja(t(), settings.openwebninja_key.clone())),
    ]
}
