// src/matching/mod.rs
//! The batch pipeline: dedupe → company allow-list → title gate → location
//! policy → skill score → threshold → stable sort by score.

pub mod location;
pub mod scoring;
pub mod title;
pub mod weights;

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dedupe::dedupe_jobs;
use crate::ingest::types::{JobPosting, Stamp};
use self::location::{extract_location_text, LocationPolicy};
use self::scoring::{calculate_match_score, Components, SkillTaxonomy};
use self::title::{is_title_excluded, is_title_included};
use self::weights::Weights;

const SNIPPET_CHARS: usize = 260;

/// Gate configuration consumed by the pipeline. `keywords` is informational
/// (reported per result, never gating); `companies` gates postings whose
/// source is "greenhouse" and nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilters {
    pub keywords: Vec<String>,
    pub include_title_keywords: Vec<String>,
    pub exclude_title_keywords: Vec<String>,
    pub companies: Vec<String>,
    pub location_policy: LocationPolicy,
    pub min_match_percent: f64,
}

/// One scored posting: the identifying fields, the hit sets and the full
/// component breakdown. This field set (and the CSV column order derived
/// from it) is a compatibility contract with downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source: String,
    pub company: String,
    pub location: String,
    pub title: String,
    pub url: String,
    pub score_percent: f64,
    pub required_hit: Vec<String>,
    pub required_miss: Vec<String>,
    pub preferred_hit: Vec<String>,
    pub keywords_hit: Vec<String>,
    pub title_hit: bool,
    pub posted_at: Option<Stamp>,
    pub created_at: Option<Stamp>,
    pub updated_at: Option<Stamp>,
    pub components: Components,
    pub snippet: String,
}

/// Score a batch of postings. Postings are independent after the initial
/// whole-batch dedupe pass; survivors come back sorted by score descending,
/// ties keeping their relative input order.
pub fn score_jobs(
    resume_text: &str,
    jobs: Vec<JobPosting>,
    skills: &SkillTaxonomy,
    weights: &Weights,
    filters: &MatchFilters,
) -> Vec<MatchResult> {
    let allowed_companies: HashSet<String> = filters
        .companies
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    let jobs = dedupe_jobs(jobs);

    let mut results = Vec::new();
    for job in &jobs {
        let source = job.source.trim().to_lowercase();
        let company = job.company.trim();

        // Company allow-list is enforced for greenhouse postings only.
        if source == "greenhouse"
            && !allowed_companies.is_empty()
            && !allowed_companies.contains(&company.to_lowercase())
        {
            continue;
        }

        let title = job.title.trim();
        if !is_title_included(title, &filters.include_title_keywords) {
            continue;
        }
        if is_title_excluded(title, &filters.exclude_title_keywords) {
            continue;
        }

        let content_text = job.content_text();
        let location_text = extract_location_text(job, &content_text);
        if !filters.location_policy.matches(&location_text) {
            continue;
        }

        let breakdown = calculate_match_score(
            resume_text,
            &content_text,
            title,
            skills,
            weights,
            &filters.keywords,
        );
        if breakdown.total_percent < filters.min_match_percent {
            continue;
        }

        let posted_at = job
            .posted_at
            .clone()
            .or_else(|| job.created_at.clone())
            .or_else(|| job.updated_at.clone());

        results.push(MatchResult {
            source: job.source.trim().to_string(),
            company: company.to_string(),
            // The original field (possibly empty) goes to output, not the
            // fallback text used for policy checks.
            location: job.structured_location(),
            title: title.to_string(),
            url: job.url.trim().to_string(),
            score_percent: breakdown.total_percent,
            required_hit: breakdown.required_hit,
            required_miss: breakdown.required_miss,
            preferred_hit: breakdown.preferred_hit,
            keywords_hit: breakdown.keywords_hit,
            title_hit: breakdown.title_hit,
            posted_at,
            created_at: job.created_at.clone(),
            updated_at: job.updated_at.clone(),
            components: breakdown.components,
            snippet: snippet(&content_text),
        });
    }

    // Stable sort: equal scores keep their relative order.
    results.sort_by(|a, b| {
        b.score_percent
            .partial_cmp(&a.score_percent)
            .unwrap_or(Ordering::Equal)
    });
    results
}

fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
