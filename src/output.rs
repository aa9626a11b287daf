// src/output.rs
//! Result serialization: results.json plus a results.csv for spreadsheet
//! triage.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ingest::types::Stamp;
use crate::matching::MatchResult;

/// CSV column order is a compatibility contract with downstream tabular
/// consumers; do not reorder.
const CSV_FIELDS: [&str; 14] = [
    "score_percent",
    "company",
    "location",
    "title",
    "url",
    "posted_at",
    "created_at",
    "updated_at",
    "required_hit",
    "required_miss",
    "preferred_hit",
    "keywords_hit",
    "title_hit",
    "snippet",
];

/// Write `results.json` and `results.csv` under `out_dir`.
pub fn write_results(results: &[MatchResult], out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let out_json = out_dir.join("results.json");
    let out_csv = out_dir.join("results.csv");

    let body = serde_json::to_string_pretty(results).context("serializing results")?;
    fs::write(&out_json, body).with_context(|| format!("writing {}", out_json.display()))?;

    fs::write(&out_csv, render_csv(results))
        .with_context(|| format!("writing {}", out_csv.display()))?;

    info!(
        matches = results.len(),
        json = %out_json.display(),
        csv = %out_csv.display(),
        "wrote results"
    );
    Ok((out_json, out_csv))
}

pub fn render_csv(results: &[MatchResult]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_FIELDS.join(","));
    out.push('\n');

    for r in results {
        let cells = [
            r.score_percent.to_string(),
            r.company.clone(),
            r.location.clone(),
            r.title.clone(),
            r.url.clone(),
            stamp_cell(&r.posted_at),
            stamp_cell(&r.created_at),
            stamp_cell(&r.updated_at),
            r.required_hit.join(", "),
            r.required_miss.join(", "),
            r.preferred_hit.join(", "),
            r.keywords_hit.join(", "),
            r.title_hit.to_string(),
            r.snippet.clone(),
        ];
        let row: Vec<String> = cells.iter().map(|c| csv_cell(c)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn stamp_cell(stamp: &Option<Stamp>) -> String {
    match stamp {
        None => String::new(),
        Some(Stamp::Text(t)) => t.clone(),
        Some(Stamp::Epoch(n)) => format!("{n}"),
    }
}

/// Minimal RFC-4180 quoting: wrap when the cell holds a comma, quote or
/// newline, doubling embedded quotes.
fn csv_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
