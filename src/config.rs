// src/config.rs
//! TOML configuration and skills-taxonomy loading.
//!
//! The config layer owns validation (weights summing to 1.0) and resolves
//! the location-filter dialect once, so the matching core never branches on
//! "is the structured table present".

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::matching::location::{LocationFilters, LocationPolicy};
use crate::matching::scoring::SkillTaxonomy;
use crate::matching::weights::Weights;
use crate::matching::MatchFilters;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Tolerance on the five configured weights summing to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub resume: ResumeCfg,
    #[serde(default)]
    pub filters: FiltersCfg,
    pub scoring: ScoringCfg,
    #[serde(default)]
    pub output: OutputCfg,
    #[serde(default)]
    pub sources: SourcesCfg,
    #[serde(default)]
    pub discovery: DiscoveryCfg,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeCfg {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FiltersCfg {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_remote_only")]
    pub remote_only: bool,
    #[serde(default = "default_min_match_percent")]
    pub min_match_percent: f64,
    #[serde(default)]
    pub include_title_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_title_keywords: Vec<String>,
    /// Presence of this table — even empty — activates the structured
    /// location dialect and the legacy fields above are ignored.
    #[serde(default)]
    pub location_filters: Option<LocationFilters>,
}

fn default_remote_only() -> bool {
    true
}

fn default_min_match_percent() -> f64 {
    70.0
}

impl Default for FiltersCfg {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            locations: Vec::new(),
            remote_only: default_remote_only(),
            min_match_percent: default_min_match_percent(),
            include_title_keywords: Vec::new(),
            exclude_title_keywords: Vec::new(),
            location_filters: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringCfg {
    pub weights: Weights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputCfg {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_explain")]
    pub explain: bool,
}

fn default_top_n() -> usize {
    20_000
}

fn default_explain() -> bool {
    true
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            explain: default_explain(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesCfg {
    #[serde(default)]
    pub greenhouse: CompanyListCfg,
    #[serde(default)]
    pub lever: CompanyListCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyListCfg {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub companies: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for CompanyListCfg {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            companies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryCfg {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_discovery_mode")]
    pub mode: String,
    #[serde(default = "default_discovery_provider")]
    pub provider: String,
    #[serde(default)]
    pub queries: Vec<String>,
}

fn default_discovery_mode() -> String {
    "company".to_string()
}

fn default_discovery_provider() -> String {
    "null".to_string()
}

impl Default for DiscoveryCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: default_discovery_mode(),
            provider: default_discovery_provider(),
            queries: Vec::new(),
        }
    }
}

impl Config {
    /// Build the pipeline's filter set, resolving the location dialect once.
    pub fn match_filters(&self) -> MatchFilters {
        let f = &self.filters;
        MatchFilters {
            keywords: f.keywords.clone(),
            include_title_keywords: f.include_title_keywords.clone(),
            exclude_title_keywords: f.exclude_title_keywords.clone(),
            companies: self.sources.greenhouse.companies.clone(),
            location_policy: LocationPolicy::resolve(
                f.location_filters.clone(),
                &f.locations,
                f.remote_only,
            ),
            min_match_percent: f.min_match_percent,
        }
    }
}

/// Load and validate the config from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    load_config_str(&content).with_context(|| format!("in config {}", path.display()))
}

/// Load from a TOML string (handy for tests).
pub fn load_config_str(content: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(content).context("parsing config TOML")?;
    validate_weights(&cfg.scoring.weights)?;
    Ok(cfg)
}

fn validate_weights(weights: &Weights) -> Result<()> {
    let total = weights.sum();
    if (total - 1.0).abs() >= WEIGHT_SUM_TOLERANCE {
        bail!("scoring weights must sum to 1.0 (got {total:.3})");
    }
    Ok(())
}

/// Load the skills taxonomy from `skills.toml` (preferred) or `skills.json`
/// next to the config file.
pub fn load_skills(config_path: &Path) -> Result<SkillTaxonomy> {
    let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    for candidate in ["skills.toml", "skills.json"] {
        let path = dir.join(candidate);
        if path.exists() {
            return load_skills_from(&path);
        }
    }
    bail!(
        "no skills.toml or skills.json found next to {}",
        config_path.display()
    )
}

/// Load a skills file. Supports TOML or JSON; the extension is a hint, not a
/// requirement.
pub fn load_skills_from(path: &Path) -> Result<SkillTaxonomy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading skills from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let taxonomy = parse_skills(&content, &ext)
        .with_context(|| format!("parsing skills at {}", path.display()))?;
    Ok(taxonomy.canonical())
}

fn parse_skills(content: &str, hint_ext: &str) -> Result<SkillTaxonomy> {
    if hint_ext == "json" {
        if let Ok(t) = serde_json::from_str::<SkillTaxonomy>(content) {
            return Ok(t);
        }
    }
    if let Ok(t) = toml::from_str::<SkillTaxonomy>(content) {
        return Ok(t);
    }
    if let Ok(t) = serde_json::from_str::<SkillTaxonomy>(content) {
        return Ok(t);
    }
    Err(anyhow!("unsupported skills format (expected TOML or JSON)"))
}
