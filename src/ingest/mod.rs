// src/ingest/mod.rs
//! Raw-job store: tolerant loading, merge-by-id, cheap change detection and
//! atomic writes, plus the refresh loop over configured sources.

pub mod providers;
pub mod types;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::SourcesCfg;
use self::providers::greenhouse::GreenhouseSource;
use self::providers::lever::LeverSource;
use self::types::{JobPosting, JobSource};

/// Read every `*.json` under `dir` (skipping `*.error.json` notes).
/// Missing directories, malformed files and non-mapping entries are all
/// tolerated; they contribute nothing.
pub fn load_raw_jobs(dir: &Path) -> Vec<JobPosting> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".json") && !n.ends_with(".error.json"))
        })
        .collect();
    paths.sort();

    let mut jobs = Vec::new();
    for path in paths {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(&content) else {
            warn!(file = %path.display(), "skipping unparsable raw-jobs file");
            continue;
        };
        let Some(list) = value.as_array() else {
            continue;
        };
        jobs.extend(list.iter().filter_map(JobPosting::from_value));
    }
    jobs
}

/// Index postings by id; records without an id are left out.
pub fn index_by_id(jobs: &[JobPosting]) -> HashMap<String, JobPosting> {
    let mut out = HashMap::with_capacity(jobs.len());
    for job in jobs {
        if let Some(id) = job.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            out.insert(id.to_string(), job.clone());
        }
    }
    out
}

/// Merge by id: existing records are kept, incoming ones with the same id
/// overwrite them, new ids are appended. Output is newest-first by the
/// posted/updated stamp so the store reads naturally.
pub fn merge_jobs(existing: &[JobPosting], incoming: &[JobPosting]) -> Vec<JobPosting> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, JobPosting> = HashMap::new();

    for job in existing.iter().chain(incoming.iter()) {
        let Some(id) = job.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        if !by_id.contains_key(id) {
            order.push(id.to_string());
        }
        by_id.insert(id.to_string(), job.clone());
    }

    let mut merged: Vec<JobPosting> = order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect();
    merged.sort_by_key(|j| {
        std::cmp::Reverse(
            j.posted_at
                .as_ref()
                .or(j.updated_at.as_ref())
                .map(types::Stamp::epoch_seconds)
                .unwrap_or(0),
        )
    });
    merged
}

/// Cheap change detector: different count, any id appearing/disappearing, or
/// any `updated_at` change.
pub fn jobs_changed(existing: &[JobPosting], merged: &[JobPosting]) -> bool {
    let ex = index_by_id(existing);
    let mg = index_by_id(merged);

    if ex.len() != mg.len() {
        return true;
    }
    for (id, merged_job) in &mg {
        match ex.get(id) {
            None => return true,
            Some(existing_job) => {
                if existing_job.updated_at != merged_job.updated_at {
                    return true;
                }
            }
        }
    }
    false
}

/// Write JSON via a sibling tmp file + rename so readers never observe a
/// half-written store.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(payload).context("serializing payload")?;
    fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub companies: usize,
    pub fetched: usize,
    pub written: usize,
    pub failures: usize,
}

/// Pull every configured source into the raw-job store. A failing company
/// leaves a `.error.json` note behind and does not stop the rest.
pub async fn refresh_all(sources: &SourcesCfg, raw_dir: &Path) -> Result<RefreshSummary> {
    let mut summary = RefreshSummary::default();

    if sources.greenhouse.enabled {
        for company in &sources.greenhouse.companies {
            let slug = company.trim().to_lowercase();
            if slug.is_empty() {
                continue;
            }
            let out_file = raw_dir.join(format!("greenhouse_{slug}.json"));
            let existing = load_store_file(&out_file);
            let source =
                GreenhouseSource::new(slug.clone()).with_existing(index_by_id(&existing));
            refresh_company(&source, &out_file, &existing, &slug, &mut summary).await;
        }
    }

    if sources.lever.enabled {
        for company in &sources.lever.companies {
            let slug = company.trim().to_lowercase();
            if slug.is_empty() {
                continue;
            }
            let out_file = raw_dir.join(format!("lever_{slug}.json"));
            let existing = load_store_file(&out_file);
            let source = LeverSource::new(slug.clone());
            refresh_company(&source, &out_file, &existing, &slug, &mut summary).await;
        }
    }

    Ok(summary)
}

async fn refresh_company(
    source: &dyn JobSource,
    out_file: &Path,
    existing: &[JobPosting],
    slug: &str,
    summary: &mut RefreshSummary,
) {
    summary.companies += 1;
    match source.fetch_jobs().await {
        Ok(incoming) => {
            summary.fetched += incoming.len();
            let merged = merge_jobs(existing, &incoming);
            let changed = jobs_changed(existing, &merged);
            if changed {
                if let Err(e) = atomic_write_json(out_file, &merged) {
                    warn!(company = slug, error = ?e, "failed to write raw-job store");
                    summary.failures += 1;
                    return;
                }
                summary.written += 1;
            }
            info!(
                source = source.name(),
                company = slug,
                incoming = incoming.len(),
                merged = merged.len(),
                changed,
                "refreshed company"
            );
        }
        Err(e) => {
            warn!(source = source.name(), company = slug, error = ?e, "refresh failed");
            summary.failures += 1;
            let err_file = out_file.with_file_name(format!(
                "{}_{slug}.error.json",
                source.name()
            ));
            let note = json!({
                "source": source.name(),
                "company": slug,
                "error": e.to_string(),
            });
            if let Err(write_err) = atomic_write_json(&err_file, &note) {
                warn!(company = slug, error = ?write_err, "failed to write error note");
            }
        }
    }
}

fn load_store_file(path: &Path) -> Vec<JobPosting> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(&content) else {
        return Vec::new();
    };
    value
        .as_array()
        .map(|list| list.iter().filter_map(JobPosting::from_value).collect())
        .unwrap_or_default()
}
