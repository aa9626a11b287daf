// src/ingest/providers/greenhouse.rs
//! Greenhouse board source: cheap list endpoint plus per-job detail calls,
//! with a delta short-circuit that skips detail fetches for unchanged jobs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::warn;

use crate::ingest::types::{JobPosting, JobSource, Stamp};

const BOARDS_API: &str = "https://boards-api.greenhouse.io/v1/boards";

#[derive(Debug, Deserialize)]
struct BoardList {
    #[serde(default)]
    jobs: Vec<BoardJob>,
}

#[derive(Debug, Deserialize)]
struct BoardJob {
    /// Numeric in practice, but tolerate strings.
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    absolute_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    updated_at: Option<Stamp>,
}

#[derive(Debug, Deserialize)]
struct BoardDetail {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    location: Option<LocationField>,
    #[serde(default)]
    created_at: Option<Stamp>,
    #[serde(default)]
    updated_at: Option<Stamp>,
}

/// Greenhouse sends `location` as `{ "name": "..." }`; tolerate a bare
/// string too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocationField {
    Named { name: Option<String> },
    Text(String),
}

impl LocationField {
    fn into_text(self) -> String {
        match self {
            LocationField::Named { name } => name.unwrap_or_default().trim().to_string(),
            LocationField::Text(s) => s.trim().to_string(),
        }
    }
}

pub struct GreenhouseSource {
    company: String,
    client: reqwest::Client,
    existing_by_id: HashMap<String, JobPosting>,
}

impl GreenhouseSource {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            client: reqwest::Client::new(),
            existing_by_id: HashMap::new(),
        }
    }

    /// Seed with records already in the store so unchanged jobs (same id,
    /// same `updated_at`, non-empty content) skip the detail call.
    pub fn with_existing(mut self, existing: HashMap<String, JobPosting>) -> Self {
        self.existing_by_id = existing;
        self
    }

    async fn fetch_detail(&self, job_id: &str) -> Option<BoardDetail> {
        let detail_url = format!("{BOARDS_API}/{}/jobs/{job_id}", self.company);
        let resp = match self.client.get(&detail_url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(company = %self.company, job = job_id, error = ?e, "detail fetch failed");
                return None;
            }
        };
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(company = %self.company, job = job_id, "detail 404");
            return None;
        }
        let resp = match resp.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                warn!(company = %self.company, job = job_id, error = ?e, "detail status error");
                return None;
            }
        };
        match resp.json::<BoardDetail>().await {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(company = %self.company, job = job_id, error = ?e, "detail parse failed");
                None
            }
        }
    }
}

#[async_trait]
impl JobSource for GreenhouseSource {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        let list_url = format!("{BOARDS_API}/{}/jobs", self.company);
        let resp = self
            .client
            .get(&list_url)
            .send()
            .await
            .with_context(|| format!("greenhouse list fetch for {}", self.company))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(company = %self.company, "no greenhouse board found");
            return Ok(Vec::new());
        }

        let list: BoardList = resp
            .error_for_status()
            .with_context(|| format!("greenhouse list status for {}", self.company))?
            .json()
            .await
            .with_context(|| format!("greenhouse list payload for {}", self.company))?;

        let mut out = Vec::with_capacity(list.jobs.len());
        for entry in list.jobs {
            let url = entry
                .absolute_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .or(entry.url.as_deref())
                .unwrap_or("")
                .trim()
                .to_string();
            let title = entry.title.as_deref().unwrap_or("").trim().to_string();
            let job_id = stable_job_id(entry.id.as_ref(), &url, &self.company, &title);
            let list_updated_at = entry.updated_at;

            // Delta short-circuit: unchanged record → reuse, no detail call.
            if let Some(existing) = self.existing_by_id.get(&job_id) {
                let has_content = existing
                    .content
                    .as_deref()
                    .is_some_and(|c| !c.is_empty());
                if has_content && existing.updated_at == list_updated_at {
                    out.push(existing.clone());
                    continue;
                }
            }

            let Some(detail) = self.fetch_detail(&job_id).await else {
                continue;
            };

            let location = detail
                .location
                .map(LocationField::into_text)
                .unwrap_or_default();
            let created_at = detail.created_at;
            let updated_at = detail.updated_at.or(list_updated_at);
            let posted_at = created_at.clone().or_else(|| updated_at.clone());

            out.push(JobPosting {
                id: Some(job_id),
                source: "greenhouse".to_string(),
                company: self.company.clone(),
                title,
                location,
                location_name: None,
                content: detail.content,
                description: None,
                url,
                created_at,
                updated_at,
                posted_at,
            });
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "greenhouse"
    }
}

/// Stable id: provider id, else the `/jobs/<digits>` url segment, else a
/// sha256 over company|title|url.
fn stable_job_id(raw: Option<&Value>, url: &str, company: &str, title: &str) -> String {
    match raw {
        Some(Value::Number(n)) => return n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
        _ => {}
    }
    extract_id_from_url(url).unwrap_or_else(|| stable_fallback_id(&[company, title, url]))
}

fn extract_id_from_url(url: &str) -> Option<String> {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"(?i)/jobs/(\d+)").unwrap());
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn stable_fallback_id(parts: &[&str]) -> String {
    let blob = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("|");
    let digest = Sha256::digest(blob.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}
