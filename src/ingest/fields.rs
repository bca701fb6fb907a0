// src/ingest/fields.rs
//! Raw key aliases shared by the classifier and the normalizer. Each list is
//! tried in order; the first non-blank value wins.

use serde_json::Value;

use crate::ingest::types::{value_to_string, RawRecord};

pub const TITLE_KEYS: &[&str] = &["title", "jobTitle", "name", "job_title"];
pub const COMPANY_KEYS: &[&str] = &["company", "company_name", "companyName", "employer_name"];
pub const URL_KEYS: &[&str] = &["url", "jobUrl", "link", "apply_url", "job_apply_link"];
pub const DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "jobDescription",
    "job_description",
    "jobExcerpt",
    "snippet",
];
pub const JOB_TYPE_KEYS: &[&str] = &[
    "type",
    "jobType",
    "job_type",
    "job_types",
    "job_employment_type",
];
pub const INDUSTRY_KEYS: &[&str] = &["industry", "jobIndustry", "category", "tags"];
pub const LOCATION_KEYS: &[&str] = &[
    "location",
    "jobGeo",
    "candidate_required_location",
    "job_location",
    "job_country",
];
pub const REMOTE_FLAG_KEYS: &[&str] = &["remote", "job_is_remote", "is_remote"];
pub const PUB_DATE_KEYS: &[&str] = &[
    "pubDate",
    "publication_date",
    "date",
    "created",
    "created_at",
    "job_posted_at_datetime_utc",
    "updated",
];

/// Location may be plain text or a nested object (`display_name`, `area`
/// list, `country`).
pub fn location_text(v: &Value) -> String {
    match v {
        Value::Object(map) => {
            if let Some(name) = map.get("display_name").map(value_to_string) {
                if !name.is_empty() {
                    return name;
                }
            }
            if let Some(area @ Value::Array(_)) = map.get("area") {
                let joined = value_to_string(area);
                if !joined.is_empty() {
                    return joined;
                }
            }
            map.get("country").map(value_to_string).unwrap_or_default()
        }
        other => value_to_string(other),
    }
}

/// First non-empty location under `LOCATION_KEYS`.
pub fn raw_location(raw: &RawRecord) -> String {
    LOCATION_KEYS
        .iter()
        .filter_map(|k| raw.get(k))
        .map(location_text)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Explicit remote flag (boolean or "true"/"false" string) from any alias.
pub fn remote_flag(raw: &RawRecord) -> Option<bool> {
    raw.flag_of(REMOTE_FLAG_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_location_prefers_display_name_then_area_then_country() {
        assert_eq!(
            location_text(&json!({"display_name": "Riyadh", "area": ["X"]})),
            "Riyadh"
        );
        assert_eq!(
            location_text(&json!({"area": ["Saudi Arabia", "Riyadh"]})),
            "Saudi Arabia, Riyadh"
        );
        assert_eq!(location_text(&json!({"country": "SA"})), "SA");
        assert_eq!(location_text(&json!({})), "");
    }

    #[test]
    fn location_and_flag_aliases() {
        let raw = RawRecord::from_value(json!({"location": "", "job_location": "Jeddah", "is_remote": "TRUE"}))
            .unwrap();
        assert_eq!(raw_location(&raw), "Jeddah");
        assert_eq!(remote_flag(&raw), Some(true));
    }
}
