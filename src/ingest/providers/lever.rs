// src/ingest/providers/lever.rs
//! Lever postings source. One endpoint returns everything; timestamps come
//! as epoch milliseconds and are normalized to ISO-8601 UTC, and detected
//! remote/hybrid hints are folded into the location string so the matcher's
//! heuristics can see them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ingest::types::{JobPosting, JobSource, Stamp};

const POSTINGS_API: &str = "https://api.lever.co/v0/postings";

fn remote_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(?i)\b(remote|work from home|wfh|distributed|anywhere|telecommute)\b")
            .unwrap()
    })
}

fn hybrid_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)\bhybrid\b").unwrap())
}

#[derive(Debug, Default, Deserialize)]
struct LeverPosting {
    #[serde(default)]
    id: Option<String>,
    /// Lever calls the title `text`.
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "hostedUrl")]
    hosted_url: Option<String>,
    #[serde(default)]
    categories: Option<LeverCategories>,
    #[serde(default, rename = "workplaceType")]
    workplace_type: Option<String>,
    #[serde(default, rename = "descriptionPlain")]
    description_plain: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at: Option<f64>,
    #[serde(default, rename = "updatedAt")]
    updated_at: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    commitment: Option<String>,
}

pub struct LeverSource {
    company: String,
    client: reqwest::Client,
}

impl LeverSource {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Turn a raw Lever payload (a JSON array) into postings. Non-array
    /// payloads and non-mapping entries yield nothing. Public so fixtures
    /// can exercise the mapping without a network.
    pub fn parse_postings(payload: &Value, company: &str) -> Vec<JobPosting> {
        let Some(entries) = payload.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let posting: LeverPosting = serde_json::from_value(entry.clone()).ok()?;
                Some(map_posting(posting, company))
            })
            .collect()
    }
}

fn map_posting(p: LeverPosting, company: &str) -> JobPosting {
    let title = clean(p.text);
    let categories = p.categories.unwrap_or_default();
    let loc_struct = clean(categories.location);
    let commitment = clean(categories.commitment);
    let workplace_type = clean(p.workplace_type);
    let desc_plain = clean(p.description_plain);
    let desc_html = clean(p.description);

    let created_at = ms_to_iso(p.created_at);
    let updated_at = ms_to_iso(p.updated_at);
    // Lever has no distinct "posted" stamp; creation is the best signal.
    let posted_at = created_at.clone();

    let mut parts: Vec<String> = Vec::new();
    for part in [&loc_struct, &workplace_type, &commitment] {
        if !part.is_empty() {
            parts.push(part.clone());
        }
    }

    let blob = [
        loc_struct.as_str(),
        workplace_type.as_str(),
        commitment.as_str(),
        title.as_str(),
        desc_plain.as_str(),
        desc_html.as_str(),
    ]
    .join(" ");
    let is_remote = remote_re().is_match(&blob);
    let is_hybrid = hybrid_re().is_match(&blob);

    // Surface the detected mode in the location text itself.
    let joined_lower = parts.join(" ").to_lowercase();
    if is_remote && !joined_lower.contains("remote") {
        parts.push("remote".to_string());
    }
    if is_hybrid && !joined_lower.contains("hybrid") {
        parts.push("hybrid".to_string());
    }

    let location = flatten_parts(&parts);
    let location = if location.is_empty() {
        if !loc_struct.is_empty() {
            loc_struct
        } else {
            workplace_type
        }
    } else {
        location
    };

    // Prefer the plain description; fall back to HTML.
    let content = if !desc_plain.is_empty() {
        desc_plain
    } else {
        desc_html
    };

    JobPosting {
        id: p.id.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        source: "lever".to_string(),
        company: company.to_string(),
        title,
        location,
        location_name: None,
        // Both fields populated for compatibility: the matcher reads
        // `content` first, older tooling reads `description`.
        content: Some(content.clone()),
        description: Some(content),
        url: clean(p.hosted_url),
        created_at,
        updated_at,
        posted_at,
    }
}

fn clean(s: Option<String>) -> String {
    s.as_deref().unwrap_or("").trim().to_string()
}

/// De-dupe parts case-insensitively, preserving order, joined with " | ".
fn flatten_parts(parts: &[String]) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<&str> = Vec::new();
    for part in parts {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        if seen.insert(p.to_lowercase()) {
            out.push(p);
        }
    }
    out.join(" | ")
}

/// Lever epoch milliseconds → ISO-8601 UTC, for consistent sorting and CSV
/// friendliness.
fn ms_to_iso(ms: Option<f64>) -> Option<Stamp> {
    let ms = ms?;
    if !ms.is_finite() || ms <= 0.0 {
        return None;
    }
    let secs = (ms / 1000.0) as i64;
    let dt = chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0)?;
    Some(Stamp::Text(dt.to_rfc3339()))
}

#[async_trait]
impl JobSource for LeverSource {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        if self.company.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{POSTINGS_API}/{}?mode=json", self.company);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("lever fetch for {}", self.company))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("lever status for {}", self.company))?;
        let payload: Value = resp
            .json()
            .await
            .with_context(|| format!("lever payload for {}", self.company))?;

        let jobs = Self::parse_postings(&payload, &self.company);
        if jobs.is_empty() {
            warn!(company = %self.company, "lever returned no postings");
        }
        Ok(jobs)
    }

    fn name(&self) -> &'static str {
        "lever"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ms_to_iso_converts_and_rejects_garbage() {
        let stamp = ms_to_iso(Some(1_709_294_400_000.0)).unwrap();
        assert_eq!(stamp.epoch_seconds(), 1_709_294_400);
        assert!(ms_to_iso(Some(-1.0)).is_none());
        assert!(ms_to_iso(None).is_none());
    }

    #[test]
    fn flatten_dedupes_case_insensitively() {
        let parts = vec![
            "Remote".to_string(),
            "remote".to_string(),
            "Full-time".to_string(),
        ];
        assert_eq!(flatten_parts(&parts), "Remote | Full-time");
    }

    #[test]
    fn remote_hint_is_injected_into_location() {
        let payload = json!([{
            "id": "abc",
            "text": "Backend Engineer",
            "hostedUrl": "https://jobs.lever.co/acme/abc",
            "categories": {"location": "Berlin", "commitment": "Full-time"},
            "descriptionPlain": "You may work from home anywhere in the EU.",
            "createdAt": 1_700_000_000_000u64
        }]);
        let jobs = LeverSource::parse_postings(&payload, "acme");
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.source, "lever");
        assert!(job.location.to_lowercase().contains("remote"));
        assert!(job.location.contains("Berlin"));
        assert!(job.created_at.is_some());
    }

    #[test]
    fn non_array_payload_yields_nothing() {
        assert!(LeverSource::parse_postings(&json!({"error": "nope"}), "acme").is_empty());
    }
}
