// src/discovery.rs
//! Job-reference discovery: company-forward (board listings) and
//! title-forward (search queries) entry points, deduplicated into one list.
//!
//! Discovery yields references, not full postings; the ingest sources fetch
//! descriptions later.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::config::Config;
use crate::ingest::providers::greenhouse::GreenhouseSource;
use crate::ingest::types::JobSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub source: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// Discovery providers turn a title query into job references.
pub trait JobDiscovery {
    fn discover(&self, query: &str) -> Vec<JobRef>;
}

/// Placeholder provider returning nothing. Lets the title-forward path be
/// wired and tested without an external search dependency.
pub struct NullDiscovery;

impl JobDiscovery for NullDiscovery {
    fn discover(&self, _query: &str) -> Vec<JobRef> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    Company,
    Title,
    Hybrid,
}

impl DiscoveryMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode.trim().to_lowercase().as_str() {
            "company" => Ok(Self::Company),
            "title" => Ok(Self::Title),
            "hybrid" => Ok(Self::Hybrid),
            other => bail!("discovery mode must be company | title | hybrid (got {other:?})"),
        }
    }
}

/// Deduplicate references. The stable `(source, company, job_id)` key is
/// preferred; url-keyed refs fall back to `(source, url)`.
pub fn dedupe_refs(refs: Vec<JobRef>) -> Vec<JobRef> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|r| {
            let key = match (&r.company, &r.job_id) {
                (Some(company), Some(id)) => {
                    format!("{}::{}::{}", r.source, company, id)
                }
                _ => format!("{}::{}", r.source, r.url),
            };
            seen.insert(key)
        })
        .collect()
}

/// High-level entry: gather refs per the configured mode, then dedupe.
pub async fn run_discovery(cfg: &Config) -> Result<Vec<JobRef>> {
    let mode = DiscoveryMode::parse(&cfg.discovery.mode)?;

    let mut refs = Vec::new();
    if matches!(mode, DiscoveryMode::Company | DiscoveryMode::Hybrid) {
        refs.extend(list_company_refs(cfg).await);
    }
    if matches!(mode, DiscoveryMode::Title | DiscoveryMode::Hybrid) {
        refs.extend(discover_title_refs(cfg));
    }
    Ok(dedupe_refs(refs))
}

async fn list_company_refs(cfg: &Config) -> Vec<JobRef> {
    let gh = &cfg.sources.greenhouse;
    if !gh.enabled {
        return Vec::new();
    }

    let mut refs = Vec::new();
    for company in &gh.companies {
        let slug = company.trim().to_lowercase();
        if slug.is_empty() {
            continue;
        }
        let source = GreenhouseSource::new(slug.clone());
        let jobs = match source.fetch_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(company = %slug, error = ?e, "company discovery failed");
                continue;
            }
        };
        for job in jobs {
            if job.url.is_empty() {
                continue;
            }
            refs.push(JobRef {
                source: "greenhouse".to_string(),
                url: job.url,
                company: Some(slug.clone()),
                job_id: job.id,
            });
        }
    }
    refs
}

fn discover_title_refs(cfg: &Config) -> Vec<JobRef> {
    if !cfg.discovery.enabled {
        return Vec::new();
    }
    // Only the null provider exists for now; search-backed providers slot in
    // here once they exist.
    let provider = NullDiscovery;
    cfg.discovery
        .queries
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .flat_map(|q| provider.discover(q))
        .collect()
}
