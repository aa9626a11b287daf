//! job-match-analyzer — CLI entrypoint.
//! Refreshes job-board sources into a local store, then ranks postings
//! against a resume with explainable, weighted match scores.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_match_analyzer::ingest::atomic_write_json;
use job_match_analyzer::{config, discovery, ingest, matching, output, resume};

#[derive(Parser)]
#[command(
    name = "job-match-analyzer",
    about = "Rank job postings against a resume with explainable scores",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Data directory holding raw jobs and results.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Score stored raw postings and write results.json / results.csv.
    Run,
    /// Pull configured job boards into the raw-job store.
    Refresh,
    /// Emit deduplicated job references (company/title/hybrid modes).
    Discover {
        /// Output path for the discovered refs.
        #[arg(long, default_value = "data/results/discovered_refs.json")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_match(&cli.config, &cli.data_dir),
        Command::Refresh => run_refresh(&cli.config, &cli.data_dir).await,
        Command::Discover { out } => run_discover(&cli.config, &out).await,
    }
}

fn run_match(config_path: &Path, data_dir: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let skills = config::load_skills(config_path)?;
    let resume_text = resume::load_resume_text(Path::new(&cfg.resume.path))?;

    let raw_dir = data_dir.join("raw_jobs");
    let jobs = ingest::load_raw_jobs(&raw_dir);
    if jobs.is_empty() {
        tracing::warn!(
            dir = %raw_dir.display(),
            "no raw jobs found; run `job-match-analyzer refresh` first"
        );
        return Ok(());
    }

    let filters = cfg.match_filters();
    let mut results = matching::score_jobs(
        &resume_text,
        jobs,
        &skills,
        &cfg.scoring.weights,
        &filters,
    );
    results.truncate(cfg.output.top_n);

    output::write_results(&results, &data_dir.join("results"))?;
    Ok(())
}

async fn run_refresh(config_path: &Path, data_dir: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let raw_dir = data_dir.join("raw_jobs");
    let summary = ingest::refresh_all(&cfg.sources, &raw_dir).await?;
    tracing::info!(
        companies = summary.companies,
        fetched = summary.fetched,
        written = summary.written,
        failures = summary.failures,
        "refresh complete"
    );
    Ok(())
}

async fn run_discover(config_path: &Path, out: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let refs = discovery::run_discovery(&cfg).await?;
    atomic_write_json(out, &refs)?;
    tracing::info!(refs = refs.len(), out = %out.display(), "discovery complete");
    Ok(())
}
