// src/dedupe.rs
//! Duplicate-posting collapse: a tiered fingerprint picks the duplicates, a
//! quality tuple picks the survivor.

use std::collections::HashMap;

use crate::ingest::types::JobPosting;
use crate::normalize::normalize_text;

/// Tiered fingerprint, first match wins: a non-empty url is the strongest
/// key, then a provider id scoped by source+company, then a fuzzy key over
/// source/company/title/location.
pub fn dedupe_key(job: &JobPosting) -> String {
    let url = job.url.trim();
    if !url.is_empty() {
        return format!("url::{url}");
    }
    if let Some(id) = job.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return format!(
            "id::{}::{}::{}",
            normalize_text(&job.source),
            normalize_text(&job.company),
            id
        );
    }
    format!(
        "fuzzy::{}::{}::{}::{}",
        normalize_text(&job.source),
        normalize_text(&job.company),
        normalize_text(&job.title),
        normalize_text(&job.structured_location())
    )
}

/// Tie-break ranking for postings sharing a dedupe key. Field order matters:
/// derived `Ord` compares lexicographically, so longer content beats newer
/// stamps, which beat a bare has-id flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality {
    pub content_len: usize,
    pub freshness: i64,
    pub has_id: bool,
}

pub fn quality(job: &JobPosting) -> Quality {
    Quality {
        content_len: job.content_text().chars().count(),
        freshness: job.newest_stamp_seconds(),
        has_id: job.has_id(),
    }
}

/// Collapse duplicates, keeping per key the posting with the strictly
/// greater quality tuple (ties keep the first seen). Retained postings come
/// back in first-seen key order so the downstream stable sort stays
/// meaningful.
pub fn dedupe_jobs(jobs: Vec<JobPosting>) -> Vec<JobPosting> {
    let total = jobs.len();
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, (JobPosting, Quality)> = HashMap::with_capacity(total);

    for job in jobs {
        let key = dedupe_key(&job);
        let q = quality(&job);
        match best.get_mut(&key) {
            None => {
                order.push(key.clone());
                best.insert(key, (job, q));
            }
            Some(slot) => {
                if q > slot.1 {
                    *slot = (job, q);
                }
            }
        }
    }

    if best.len() < total {
        tracing::debug!(collapsed = total - best.len(), kept = best.len(), "deduplicated postings");
    }

    order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .map(|(job, _)| job)
        .collect()
}
