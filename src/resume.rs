// src/resume.rs
//! Resume text loading.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Load the resume as plain text. PDFs are rejected with a hint rather than
/// silently mis-read; convert them to text first.
pub fn load_resume_text(path: &Path) -> Result<String> {
    if !path.exists() {
        bail!("resume not found: {}", path.display());
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "pdf" {
        bail!(
            "PDF resumes are not supported: {}\nConvert to plain text first, e.g.: pdftotext resume.pdf resume.txt",
            path.display()
        );
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading resume from {}", path.display()))?;
    if text.trim().is_empty() {
        bail!("resume is empty: {}", path.display());
    }
    Ok(text)
}
