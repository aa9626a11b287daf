// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Timestamp as delivered by job boards: ISO-8601 text (Greenhouse) or an
/// epoch-milliseconds number (Lever). Kept in its original shape so output
/// round-trips what the provider sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stamp {
    Text(String),
    Epoch(f64),
}

impl Stamp {
    /// Best-effort conversion to comparable epoch seconds.
    /// Unparsable/missing resolves to 0 ("oldest possible"), never an error.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            Stamp::Epoch(n) => {
                if !n.is_finite() || *n <= 0.0 {
                    return 0;
                }
                // Anything past ~year 2286 in seconds must be milliseconds.
                if *n > 10_000_000_000.0 {
                    (*n / 1000.0) as i64
                } else {
                    *n as i64
                }
            }
            Stamp::Text(s) => parse_iso_seconds(s),
        }
    }
}

fn parse_iso_seconds(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return dt.timestamp();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return dt.and_utc().timestamp();
        }
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return dt.and_utc().timestamp();
        }
    }
    0
}

/// One job posting as fetched from a board. Every field is optional in the
/// wild; absent or mistyped fields degrade to empty rather than failing the
/// record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Stamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Stamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<Stamp>,
}

impl JobPosting {
    /// Tolerant construction from arbitrary JSON. Non-mapping input yields
    /// `None` (the record is skipped); fields of unexpected type degrade to
    /// empty/absent.
    pub fn from_value(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        Some(Self {
            id: id_ish(obj.get("id")),
            source: text(obj.get("source")),
            company: text(obj.get("company")),
            title: text(obj.get("title")),
            location: text(obj.get("location")),
            location_name: opt_text(obj.get("location_name")),
            content: opt_text(obj.get("content")),
            description: opt_text(obj.get("description")),
            url: text(obj.get("url")),
            created_at: stamp(obj.get("created_at")),
            updated_at: stamp(obj.get("updated_at")),
            posted_at: stamp(obj.get("posted_at")),
        })
    }

    /// Raw description with HTML stripped when the field looks like HTML.
    pub fn content_text(&self) -> String {
        let raw = self
            .content
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.description.as_deref())
            .unwrap_or("");
        if raw.contains('<') {
            crate::normalize::html_to_text(raw)
        } else {
            raw.to_string()
        }
    }

    /// The location-ish field for output and policy checks: `location`, else
    /// `location_name`, else empty.
    pub fn structured_location(&self) -> String {
        let loc = self.location.trim();
        if !loc.is_empty() {
            return loc.to_string();
        }
        self.location_name
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    }

    /// Newest of the available timestamps, as epoch seconds (0 if none parse).
    pub fn newest_stamp_seconds(&self) -> i64 {
        [&self.created_at, &self.updated_at, &self.posted_at]
            .into_iter()
            .flatten()
            .map(Stamp::epoch_seconds)
            .max()
            .unwrap_or(0)
    }

    pub fn has_id(&self) -> bool {
        self.id
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty())
    }
}

fn text(v: Option<&Value>) -> String {
    v.and_then(Value::as_str).unwrap_or("").trim().to_string()
}

fn opt_text(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).map(|s| s.to_string())
}

/// Provider ids are strings for Lever and numbers for Greenhouse.
fn id_ish(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn stamp(v: Option<&Value>) -> Option<Stamp> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(Stamp::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(Stamp::Epoch),
        _ => None,
    }
}

/// A provider of raw postings (Greenhouse, Lever, ...). The matcher never
/// cares which variant produced a posting beyond its `source` field.
#[async_trait::async_trait]
pub trait JobSource {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamp_parses_iso_and_epoch_ms() {
        let iso = Stamp::Text("2024-03-01T12:00:00Z".into());
        assert_eq!(iso.epoch_seconds(), 1_709_294_400);

        let ms = Stamp::Epoch(1_709_294_400_000.0);
        assert_eq!(ms.epoch_seconds(), 1_709_294_400);

        let secs = Stamp::Epoch(1_709_294_400.0);
        assert_eq!(secs.epoch_seconds(), 1_709_294_400);
    }

    #[test]
    fn stamp_tolerates_garbage() {
        assert_eq!(Stamp::Text("next tuesday".into()).epoch_seconds(), 0);
        assert_eq!(Stamp::Epoch(-5.0).epoch_seconds(), 0);
    }

    #[test]
    fn from_value_skips_non_mappings() {
        assert!(JobPosting::from_value(&json!("just a string")).is_none());
        assert!(JobPosting::from_value(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn from_value_degrades_bad_fields() {
        let v = json!({
            "id": 12345,
            "title": "Backend Engineer",
            "company": ["not", "a", "string"],
            "location": null,
            "updated_at": "2024-01-15T00:00:00Z",
            "created_at": 1_700_000_000_000u64
        });
        let job = JobPosting::from_value(&v).unwrap();
        assert_eq!(job.id.as_deref(), Some("12345"));
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.company, "");
        assert_eq!(job.location, "");
        assert!(job.newest_stamp_seconds() > 0);
    }

    #[test]
    fn structured_location_falls_back_to_location_name() {
        let v = json!({"location": "  ", "location_name": "Austin, TX"});
        let job = JobPosting::from_value(&v).unwrap();
        assert_eq!(job.structured_location(), "Austin, TX");
    }

    #[test]
    fn content_text_strips_html_only_when_present() {
        let html = JobPosting {
            content: Some("<p>Rust &amp; Go</p>".into()),
            ..JobPosting::default()
        };
        assert_eq!(html.content_text(), "Rust & Go");

        let plain = JobPosting {
            description: Some("Rust and Go".into()),
            ..JobPosting::default()
        };
        assert_eq!(plain.content_text(), "Rust and Go");
    }
}
