// src/matching/location.rs
//! Free-text location classification and the dual-dialect location policy.
//!
//! Two overlapping filter dialects exist in the wild: the legacy flat
//! `locations` + `remote_only` fields, and the structured `location_filters`
//! table. The dialect is resolved once, at configuration parse time, into a
//! [`LocationPolicy`] — presence of the structured table (even empty)
//! supersedes the legacy fields entirely.

use serde::{Deserialize, Serialize};

use crate::ingest::types::JobPosting;
use crate::normalize::{normalize_text, unique_lower};

const REMOTE_TOKENS: [&str; 7] = [
    "remote",
    "work from home",
    "wfh",
    "distributed",
    "anywhere",
    "home-based",
    "telecommute",
];

/// Explicit country-level US phrases, matched as standalone tokens.
const US_PHRASES: [&str; 3] = ["united states", "united states of america", "usa"];

/// What a filter list means by "the US".
const US_COUNTRY_SYNONYMS: [&str; 3] = ["united states", "usa", "us"];

const US_STATE_ABBRS: [&str; 51] = [
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id", "il", "in", "ia", "ks",
    "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv", "nh", "nj", "nm", "ny",
    "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt", "va", "wa", "wv",
    "wi", "wy", "dc",
];

const US_STATE_NAMES: [&str; 53] = [
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "florida",
    "georgia",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "new york",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virginia",
    "washington",
    "west virginia",
    "wisconsin",
    "wyoming",
    "district of columbia",
    "washington dc",
    "d.c.",
];

/// Standalone "u.s." / "u.s" / "us" token, bounded by whitespace or
/// punctuation so "business" or "status" never match but "(U.S.)" does.
fn standalone_us_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(^|[\s,|/(\[])(u\.s\.?|us)([\s,|/)\]]|$)").unwrap()
    })
}

/// Any two-letter token bounded by whitespace/punctuation, e.g. ", tx",
/// " tx ", "(tx)", "/tx". The capture is compared against the state tables.
fn two_letter_token_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"(?:^|[\s,|/(\[])([a-z]{2})(?:$|[\s,|/)\]])").unwrap())
}

/// True if any remote-work token appears in the (normalized) text.
pub fn is_remote(text: &str) -> bool {
    let t = normalize_text(text);
    REMOTE_TOKENS.iter().any(|tok| t.contains(tok))
}

/// Heuristic US detector for location-ish text.
///
/// Only pass actual location-ish text here, never a bare job description:
/// descriptions are full of "About us" and similar phrases that read as a
/// standalone "us" token.
pub fn looks_like_us(location_text: &str) -> bool {
    let t = format!(" {} ", normalize_text(location_text));
    if t.trim().is_empty() {
        return false;
    }

    if US_PHRASES.iter().any(|tok| t.contains(&format!(" {tok} "))) {
        return true;
    }

    if standalone_us_re().is_match(&t) {
        return true;
    }

    for name in US_STATE_NAMES {
        if t.contains(&format!(" {name} "))
            || t.contains(&format!("{name},"))
            || t.contains(&format!("{name}|"))
            || t.contains(&format!("{name}/"))
        {
            return true;
        }
    }

    two_letter_token_re()
        .captures_iter(&t)
        .filter_map(|caps| caps.get(1))
        .any(|m| US_STATE_ABBRS.contains(&m.as_str()))
}

/// Per allowed state: two-letter abbreviations need a full-token boundary
/// match; full names match as substrings.
pub fn matches_states(text: &str, allowed_states: &[String]) -> bool {
    if allowed_states.is_empty() {
        return false;
    }
    let t = format!(" {} ", normalize_text(text));
    for state in allowed_states {
        let s = normalize_text(state);
        if s.is_empty() {
            continue;
        }
        if s.len() == 2 {
            let hit = two_letter_token_re()
                .captures_iter(&t)
                .filter_map(|caps| caps.get(1))
                .any(|m| m.as_str() == s);
            if hit {
                return true;
            }
        } else if t.contains(&s) {
            return true;
        }
    }
    false
}

/// Substring match of each allowed city against the normalized text.
pub fn matches_cities(text: &str, allowed_cities: &[String]) -> bool {
    if allowed_cities.is_empty() {
        return false;
    }
    let t = normalize_text(text);
    allowed_cities.iter().any(|city| {
        let c = normalize_text(city);
        !c.is_empty() && t.contains(&c)
    })
}

/// The text the location policy sees. Prefer the structured location field;
/// when it is empty, fall back to the title plus the normalized content as a
/// weak remote/keyword hint. Content never stands alone — the title always
/// leads the fallback.
pub fn extract_location_text(job: &JobPosting, content_text: &str) -> String {
    let loc = job.structured_location();
    if !loc.is_empty() {
        return loc;
    }
    let title = job.title.trim();
    let content = normalize_text(content_text);
    if content.is_empty() {
        title.to_string()
    } else {
        format!("{title} {content}")
    }
}

/// Structured location policy (the `location_filters` dialect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFilters {
    #[serde(default = "default_allow_remote")]
    pub allow_remote: bool,
    #[serde(default)]
    pub allowed_countries: Vec<String>,
    #[serde(default)]
    pub allowed_states: Vec<String>,
    #[serde(default)]
    pub allowed_cities: Vec<String>,
}

fn default_allow_remote() -> bool {
    true
}

impl Default for LocationFilters {
    fn default() -> Self {
        Self {
            allow_remote: true,
            allowed_countries: Vec::new(),
            allowed_states: Vec::new(),
            allowed_cities: Vec::new(),
        }
    }
}

/// The two filter dialects, resolved once at configuration parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationPolicy {
    Legacy {
        locations: Vec<String>,
        remote_only: bool,
    },
    Structured(LocationFilters),
}

impl Default for LocationPolicy {
    fn default() -> Self {
        LocationPolicy::Legacy {
            locations: Vec::new(),
            remote_only: false,
        }
    }
}

impl LocationPolicy {
    /// Resolve the dialect: a present `location_filters` table — even one
    /// with every sub-list empty — activates structured mode and the legacy
    /// fields are ignored entirely.
    pub fn resolve(
        location_filters: Option<LocationFilters>,
        legacy_locations: &[String],
        legacy_remote_only: bool,
    ) -> Self {
        match location_filters {
            Some(filters) => LocationPolicy::Structured(filters),
            None => LocationPolicy::Legacy {
                locations: legacy_locations.to_vec(),
                remote_only: legacy_remote_only,
            },
        }
    }

    /// Decide whether a posting's location text satisfies this policy.
    pub fn matches(&self, location_text: &str) -> bool {
        let loc = normalize_text(location_text);
        match self {
            LocationPolicy::Structured(filters) => structured_matches(&loc, filters),
            LocationPolicy::Legacy {
                locations,
                remote_only,
            } => legacy_matches(&loc, locations, *remote_only),
        }
    }
}

fn structured_matches(loc: &str, filters: &LocationFilters) -> bool {
    let allowed_countries = unique_lower(&filters.allowed_countries);
    let allowed_states = unique_lower(&filters.allowed_states);
    let allowed_cities = unique_lower(&filters.allowed_cities);

    let wants_us_only = allowed_countries
        .iter()
        .any(|c| US_COUNTRY_SYNONYMS.contains(&c.as_str()));
    let job_is_remote = is_remote(loc);

    if job_is_remote {
        if !filters.allow_remote {
            return false;
        }
        if !allowed_countries.is_empty() {
            if wants_us_only {
                // State names/abbreviations count as US signals too.
                return looks_like_us(loc);
            }
            return allowed_countries.iter().any(|c| loc.contains(c.as_str()));
        }
        return true;
    }

    if wants_us_only && !looks_like_us(loc) {
        return false;
    }

    // City/state constraints apply to on-site postings only, so a remote-US
    // policy is not blocked by an empty city/state list.
    if !allowed_states.is_empty() || !allowed_cities.is_empty() {
        return matches_cities(loc, &allowed_cities) || matches_states(loc, &allowed_states);
    }

    true
}

fn legacy_matches(loc: &str, locations: &[String], remote_only: bool) -> bool {
    let wanted = unique_lower(locations);

    if remote_only && !is_remote(loc) {
        return false;
    }
    if wanted.is_empty() {
        return true;
    }

    let wants_us = wanted
        .iter()
        .any(|w| US_COUNTRY_SYNONYMS.contains(&w.as_str()));
    let wants_remote = wanted.iter().any(|w| w.contains("remote"));

    if wants_us && !looks_like_us(loc) {
        return false;
    }
    if wants_remote && !is_remote(loc) {
        return false;
    }
    if wants_us || wants_remote {
        return true;
    }

    // Plain wanted tokens must literally appear in the location text.
    wanted.iter().any(|w| loc.contains(w.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remote_tokens_detected() {
        assert!(is_remote("Remote (U.S.)"));
        assert!(is_remote("Work from Home - EMEA"));
        assert!(is_remote("100% telecommute"));
        assert!(!is_remote("New York, NY"));
    }

    #[test]
    fn us_detection_bounded_tokens() {
        assert!(looks_like_us("Remote (U.S.)"));
        assert!(looks_like_us("United States"));
        assert!(looks_like_us("Austin, TX"));
        assert!(looks_like_us("texas"));
        assert!(looks_like_us("US"));
        // "us" inside a word must not count.
        assert!(!looks_like_us("business development hub"));
        assert!(!looks_like_us("Remote - Poland"));
        assert!(!looks_like_us(""));
    }

    #[test]
    fn state_matching_boundary_vs_substring() {
        assert!(matches_states("Austin, TX", &strs(&["TX"])));
        assert!(matches_states("somewhere in texas", &strs(&["Texas"])));
        // Abbreviations need token boundaries: "tx" inside a word is no hit.
        assert!(!matches_states("context switching", &strs(&["TX"])));
        assert!(!matches_states("Austin, TX", &strs(&[])));
    }

    #[test]
    fn city_matching_is_substring() {
        assert!(matches_cities("Greater Austin Area", &strs(&["austin"])));
        assert!(!matches_cities("Dallas, TX", &strs(&["austin"])));
    }

    #[test]
    fn structured_us_remote_accepted() {
        let policy = LocationPolicy::Structured(LocationFilters {
            allow_remote: true,
            allowed_countries: strs(&["united states"]),
            ..LocationFilters::default()
        });
        assert!(policy.matches("Remote (U.S.)"));
        assert!(!policy.matches("Remote - Poland"));
    }

    #[test]
    fn structured_rejects_remote_when_disallowed() {
        let policy = LocationPolicy::Structured(LocationFilters {
            allow_remote: false,
            allowed_states: strs(&["TX"]),
            ..LocationFilters::default()
        });
        assert!(!policy.matches("Remote (U.S.)"));
        assert!(policy.matches("Austin, TX"));
    }

    #[test]
    fn structured_state_gate_applies_to_onsite_only() {
        let policy = LocationPolicy::Structured(LocationFilters {
            allow_remote: true,
            allowed_countries: strs(&["usa"]),
            allowed_states: strs(&["TX"]),
            ..LocationFilters::default()
        });
        // Remote US posting passes even though it names no state.
        assert!(policy.matches("Remote, United States"));
        // On-site posting must hit the state list.
        assert!(policy.matches("Austin, TX"));
        assert!(!policy.matches("New York, NY"));
    }

    #[test]
    fn structured_non_us_country_substring() {
        let policy = LocationPolicy::Structured(LocationFilters {
            allow_remote: true,
            allowed_countries: strs(&["germany"]),
            ..LocationFilters::default()
        });
        assert!(policy.matches("Remote - Germany"));
        assert!(!policy.matches("Remote - France"));
    }

    #[test]
    fn empty_structured_table_accepts_anything() {
        let policy = LocationPolicy::Structured(LocationFilters::default());
        assert!(policy.matches("Remote - Anywhere"));
        assert!(policy.matches("Paris, France"));
        assert!(policy.matches(""));
    }

    #[test]
    fn legacy_remote_only_gate() {
        let policy = LocationPolicy::Legacy {
            locations: Vec::new(),
            remote_only: true,
        };
        assert!(policy.matches("Remote"));
        assert!(!policy.matches("Austin, TX"));
    }

    #[test]
    fn legacy_us_and_remote_implications() {
        let policy = LocationPolicy::Legacy {
            locations: strs(&["United States", "Remote"]),
            remote_only: false,
        };
        assert!(policy.matches("Remote (U.S.)"));
        assert!(!policy.matches("Remote - Poland")); // fails US signal
        assert!(!policy.matches("Austin, TX")); // fails remote requirement
    }

    #[test]
    fn legacy_plain_tokens_require_substring() {
        let policy = LocationPolicy::Legacy {
            locations: strs(&["berlin"]),
            remote_only: false,
        };
        assert!(policy.matches("Berlin, Germany"));
        assert!(!policy.matches("Munich, Germany"));
    }

    #[test]
    fn resolve_prefers_structured_presence() {
        let policy = LocationPolicy::resolve(
            Some(LocationFilters::default()),
            &strs(&["berlin"]),
            true,
        );
        assert!(matches!(policy, LocationPolicy::Structured(_)));
        // Legacy remote_only/locations are ignored entirely.
        assert!(policy.matches("Munich, Germany"));

        let legacy = LocationPolicy::resolve(None, &strs(&["berlin"]), false);
        assert!(matches!(legacy, LocationPolicy::Legacy { .. }));
    }

    #[test]
    fn fallback_text_leads_with_title() {
        let job = JobPosting {
            title: "Senior Backend Engineer (Remote)".into(),
            ..JobPosting::default()
        };
        let text = extract_location_text(&job, "");
        assert_eq!(text, "Senior Backend Engineer (Remote)");
        assert!(is_remote(&text));

        let with_loc = JobPosting {
            location: "Austin, TX".into(),
            title: "Engineer".into(),
            ..JobPosting::default()
        };
        assert_eq!(extract_location_text(&with_loc, "ignored"), "Austin, TX");
    }
}
