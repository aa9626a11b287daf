// src/matching/scoring.rs
//! Explainable skill scoring: per-category hit sets plus a weighted,
//! renormalized percentage. Pure — the only gate applied elsewhere is the
//! final minimum-score threshold.

use serde::{Deserialize, Serialize};

use super::weights::Weights;
use crate::normalize::{normalize_text, unique_lower};

/// Skill taxonomy: three ordered phrase lists, case-insensitively
/// deduplicated on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillTaxonomy {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub preferred: Vec<String>,
    #[serde(default)]
    pub titles: Vec<String>,
}

impl SkillTaxonomy {
    /// Canonical form: trimmed, lowercased, deduplicated, order preserved.
    pub fn canonical(&self) -> Self {
        Self {
            required: unique_lower(&self.required),
            preferred: unique_lower(&self.preferred),
            titles: unique_lower(&self.titles),
        }
    }
}

/// Every intermediate that feeds the total, exposed for auditability.
/// The `_unused` slots echo the configured inert weights so a reader can see
/// they were accepted and ignored — that inertness is a contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub required_score: f64,
    pub preferred_score: f64,
    pub keyword_score: f64,
    pub title_score: f64,
    pub w_required: f64,
    pub w_preferred: f64,
    pub w_title: f64,
    pub w_semantic_unused: f64,
    pub w_experience_unused: f64,
}

/// Explainable score 0–100 plus what matched and what missed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_percent: f64,
    pub required_hit: Vec<String>,
    pub required_miss: Vec<String>,
    pub preferred_hit: Vec<String>,
    pub keywords_hit: Vec<String>,
    pub title_hit: bool,
    pub components: Components,
}

fn hits(haystack: &str, terms: &[String]) -> (Vec<String>, Vec<String>) {
    let mut hit = Vec::new();
    let mut miss = Vec::new();
    for term in terms {
        if !term.is_empty() && haystack.contains(term.as_str()) {
            hit.push(term.clone());
        } else {
            miss.push(term.clone());
        }
    }
    (hit, miss)
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total.max(1) as f64
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Score one posting against a resume, a skill taxonomy and the configured
/// weights. `keywords` hits are reported for diagnostics but never weighted
/// into the total.
pub fn calculate_match_score(
    resume_text: &str,
    job_text: &str,
    job_title: &str,
    skills: &SkillTaxonomy,
    weights: &Weights,
    keywords: &[String],
) -> ScoreBreakdown {
    let resume_n = normalize_text(resume_text);
    let job_n = normalize_text(job_text);
    let title_n = normalize_text(job_title);

    let skills = skills.canonical();
    let keywords = unique_lower(keywords);

    // Skills may be demonstrated on either side: the resume shows them, or
    // the posting restates them. Keywords are matched against the posting
    // alone.
    let combined = format!("{resume_n} {job_n}");

    let (required_hit, required_miss) = hits(&combined, &skills.required);
    let (preferred_hit, _) = hits(&combined, &skills.preferred);
    let (keywords_hit, _) = hits(&job_n, &keywords);

    let required_score = ratio(required_hit.len(), skills.required.len());
    let preferred_score = ratio(preferred_hit.len(), skills.preferred.len());
    let keyword_score = ratio(keywords_hit.len(), keywords.len());

    // No title phrases configured → the title signal is absent, not zero.
    let title_hit =
        !skills.titles.is_empty() && skills.titles.iter().any(|t| title_n.contains(t.as_str()));
    let title_score = if title_hit { 1.0 } else { 0.0 };

    let active = weights.active();
    let total = required_score * active.required
        + preferred_score * active.preferred
        + title_score * active.title;
    let total_percent = round2(total * 100.0);

    ScoreBreakdown {
        total_percent,
        required_hit,
        required_miss,
        preferred_hit,
        keywords_hit,
        title_hit,
        components: Components {
            required_score: round4(required_score),
            preferred_score: round4(preferred_score),
            keyword_score: round4(keyword_score),
            title_score: round4(title_score),
            w_required: round4(active.required),
            w_preferred: round4(active.preferred),
            w_title: round4(active.title),
            w_semantic_unused: round4(weights.semantic_similarity),
            w_experience_unused: round4(weights.experience),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn default_weights() -> Weights {
        Weights {
            required_skills: 0.6,
            preferred_skills: 0.3,
            title_similarity: 0.1,
            ..Weights::default()
        }
    }

    #[test]
    fn full_required_match_scores_its_weight() {
        let skills = SkillTaxonomy {
            required: strs(&["python", "aws"]),
            preferred: strs(&["kubernetes"]),
            titles: Vec::new(),
        };
        let b = calculate_match_score(
            "Seasoned with Python, AWS",
            "Python and AWS experience required",
            "Backend Engineer",
            &skills,
            &default_weights(),
            &[],
        );
        assert_eq!(b.required_hit, strs(&["python", "aws"]));
        assert!(b.required_miss.is_empty());
        assert_eq!(b.components.required_score, 1.0);
        assert_eq!(b.components.preferred_score, 0.0);
        assert!(!b.title_hit);
        assert_eq!(b.total_percent, 60.0);
    }

    #[test]
    fn skills_count_from_either_side() {
        let skills = SkillTaxonomy {
            required: strs(&["terraform"]),
            ..SkillTaxonomy::default()
        };
        // Only the posting mentions it; the resume does not.
        let b = calculate_match_score(
            "Plain resume",
            "We use Terraform daily",
            "",
            &skills,
            &default_weights(),
            &[],
        );
        assert_eq!(b.required_hit, strs(&["terraform"]));
    }

    #[test]
    fn keywords_hit_posting_only_and_never_weigh_in() {
        let skills = SkillTaxonomy::default();
        let b = calculate_match_score(
            "resume mentions fintech",
            "posting mentions healthtech",
            "",
            &skills,
            &default_weights(),
            &strs(&["fintech", "healthtech"]),
        );
        assert_eq!(b.keywords_hit, strs(&["healthtech"]));
        assert_eq!(b.components.keyword_score, 0.5);
        assert_eq!(b.total_percent, 0.0);
    }

    #[test]
    fn title_phrases_gate_the_title_signal() {
        let mut skills = SkillTaxonomy {
            titles: strs(&["backend engineer"]),
            ..SkillTaxonomy::default()
        };
        let weights = default_weights();

        let hit = calculate_match_score("", "", "Senior Backend Engineer", &skills, &weights, &[]);
        assert!(hit.title_hit);
        assert_eq!(hit.components.title_score, 1.0);
        assert_eq!(hit.total_percent, 10.0);

        let miss = calculate_match_score("", "", "Product Manager", &skills, &weights, &[]);
        assert!(!miss.title_hit);
        assert_eq!(miss.components.title_score, 0.0);

        skills.titles.clear();
        let none = calculate_match_score("", "", "Senior Backend Engineer", &skills, &weights, &[]);
        assert!(!none.title_hit);
    }

    #[test]
    fn inert_weights_are_echoed_but_never_scored() {
        let skills = SkillTaxonomy {
            required: strs(&["rust"]),
            ..SkillTaxonomy::default()
        };
        let weights = Weights {
            required_skills: 0.3,
            preferred_skills: 0.2,
            semantic_similarity: 0.25,
            experience: 0.15,
            title_similarity: 0.1,
        };
        let b = calculate_match_score("rust", "", "", &skills, &weights, &[]);
        assert_eq!(b.components.w_semantic_unused, 0.25);
        assert_eq!(b.components.w_experience_unused, 0.15);
        // Active weights renormalize over 0.6: required becomes 0.5.
        assert_eq!(b.components.w_required, 0.5);
        assert_eq!(b.total_percent, 50.0);
    }

    #[test]
    fn renormalized_weights_sum_to_one() {
        let weights = default_weights();
        let b = calculate_match_score("", "", "", &SkillTaxonomy::default(), &weights, &[]);
        let sum = b.components.w_required + b.components.w_preferred + b.components.w_title;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_stays_within_bounds() {
        let skills = SkillTaxonomy {
            required: strs(&["a", "b"]),
            preferred: strs(&["c"]),
            titles: strs(&["engineer"]),
        };
        let b = calculate_match_score(
            "a b c",
            "a b c",
            "engineer",
            &skills,
            &default_weights(),
            &[],
        );
        assert!(b.total_percent >= 0.0 && b.total_percent <= 100.0);
        assert_eq!(b.total_percent, 100.0);

        let empty = calculate_match_score("", "", "", &SkillTaxonomy::default(), &default_weights(), &[]);
        assert_eq!(empty.total_percent, 0.0);
    }
}
