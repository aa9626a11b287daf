// src/matching/weights.rs
//! The five configured scoring weights, and the renormalized active subset
//! that actually drives the total.

use serde::{Deserialize, Serialize};

/// The five weight slots accepted from configuration.
///
/// `semantic_similarity` and `experience` are a documented contract, not an
/// accident: they are parsed, validated and echoed back in the score
/// breakdown, but they never enter the weighted total. Missing keys default
/// to 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default)]
    pub required_skills: f64,
    #[serde(default)]
    pub preferred_skills: f64,
    #[serde(default)]
    pub semantic_similarity: f64,
    #[serde(default)]
    pub experience: f64,
    #[serde(default)]
    pub title_similarity: f64,
}

/// The three active weights rescaled so they sum to exactly 1.0, regardless
/// of how much weight the configuration parked on the inert slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveWeights {
    pub required: f64,
    pub preferred: f64,
    pub title: f64,
}

impl Weights {
    /// Sum over all five slots (what the config validator checks against 1.0).
    pub fn sum(&self) -> f64 {
        self.required_skills
            + self.preferred_skills
            + self.semantic_similarity
            + self.experience
            + self.title_similarity
    }

    /// Renormalize the active subset. A non-positive active sum falls back to
    /// a denominator of 1.0 so scoring never divides by zero.
    pub fn active(&self) -> ActiveWeights {
        let mut active_total = self.required_skills + self.preferred_skills + self.title_similarity;
        if active_total <= 0.0 {
            active_total = 1.0;
        }
        ActiveWeights {
            required: self.required_skills / active_total,
            preferred: self.preferred_skills / active_total,
            title: self.title_similarity / active_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_weights_renormalize_to_one() {
        // 0.2 sits on the inert slots; the active three still sum to 1.0.
        let w = Weights {
            required_skills: 0.5,
            preferred_skills: 0.2,
            semantic_similarity: 0.1,
            experience: 0.1,
            title_similarity: 0.1,
        };
        let a = w.active();
        assert!((a.required + a.preferred + a.title - 1.0).abs() < 1e-9);
        assert!((a.required - 0.625).abs() < 1e-9);
    }

    #[test]
    fn zero_active_weights_do_not_divide_by_zero() {
        let w = Weights {
            semantic_similarity: 0.5,
            experience: 0.5,
            ..Weights::default()
        };
        let a = w.active();
        assert_eq!(a.required, 0.0);
        assert_eq!(a.preferred, 0.0);
        assert_eq!(a.title, 0.0);
    }

    #[test]
    fn missing_keys_deserialize_to_zero() {
        let w: Weights = serde_json::from_str(r#"{"required_skills": 0.7}"#).unwrap();
        assert_eq!(w.required_skills, 0.7);
        assert_eq!(w.preferred_skills, 0.0);
        assert_eq!(w.title_similarity, 0.0);
    }
}
