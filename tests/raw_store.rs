// tests/raw_store.rs
//
// The raw-job store must shrug off whatever half-broken JSON ends up on
// disk, and its merge/change-detection cycle must be cheap and atomic.

use job_match_analyzer::ingest::types::Stamp;
use job_match_analyzer::ingest::{
    atomic_write_json, index_by_id, jobs_changed, load_raw_jobs, merge_jobs,
};
use job_match_analyzer::JobPosting;
use std::fs;

fn job(id: &str, updated: &str) -> JobPosting {
    JobPosting {
        id: Some(id.into()),
        source: "greenhouse".into(),
        company: "acme".into(),
        title: format!("Job {id}"),
        updated_at: Some(Stamp::Text(updated.into())),
        ..JobPosting::default()
    }
}

#[test]
fn loads_good_files_and_skips_broken_ones() {
    let dir = tempfile::tempdir().unwrap();

    // A healthy store file.
    fs::write(
        dir.path().join("greenhouse_acme.json"),
        r#"[
            {"id": "1", "title": "Backend Engineer", "source": "greenhouse"},
            "not a mapping",
            {"id": "2", "title": 42, "source": "greenhouse"}
        ]"#,
    )
    .unwrap();

    // Broken JSON, an error note and a non-array payload: all ignored.
    fs::write(dir.path().join("greenhouse_bad.json"), "{{{nope").unwrap();
    fs::write(
        dir.path().join("greenhouse_acme.error.json"),
        r#"{"error": "boom"}"#,
    )
    .unwrap();
    fs::write(dir.path().join("lever_obj.json"), r#"{"jobs": []}"#).unwrap();

    let jobs = load_raw_jobs(dir.path());
    // Two mappings survive; the string entry is skipped, the numeric title
    // degrades to empty.
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().any(|j| j.title == "Backend Engineer"));
    assert!(jobs.iter().any(|j| j.title.is_empty()));
}

#[test]
fn missing_dir_is_just_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist");
    assert!(load_raw_jobs(&missing).is_empty());
}

#[test]
fn merge_then_write_then_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("greenhouse_acme.json");

    let existing = vec![job("1", "2024-01-01T00:00:00Z")];
    let incoming = vec![job("1", "2024-02-01T00:00:00Z"), job("2", "2024-01-15T00:00:00Z")];

    let merged = merge_jobs(&existing, &incoming);
    assert!(jobs_changed(&existing, &merged));
    atomic_write_json(&store, &merged).unwrap();

    let reloaded = load_raw_jobs(dir.path());
    assert_eq!(reloaded.len(), 2);
    let by_id = index_by_id(&reloaded);
    assert_eq!(
        by_id.get("1").unwrap().updated_at,
        Some(Stamp::Text("2024-02-01T00:00:00Z".into()))
    );

    // A second merge with the same incoming set changes nothing.
    let merged_again = merge_jobs(&reloaded, &incoming);
    assert!(!jobs_changed(&reloaded, &merged_again));
}

#[test]
fn atomic_write_leaves_no_tmp_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("nested").join("store.json");
    atomic_write_json(&store, &vec![job("1", "2024-01-01T00:00:00Z")]).unwrap();

    assert!(store.exists());
    let siblings: Vec<_> = fs::read_dir(store.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(siblings, vec!["store.json".to_string()]);
}
