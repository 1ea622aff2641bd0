//! Geoverdict command-line entrypoint.
//!
//! `geoverdict <image>...` resolves each file and prints one JSON object per line.

use std::path::PathBuf;

use anyhow::Context;
use mimalloc::MiMalloc;
use serde_json::json;

use geoverdict::config::Config;
use geoverdict::pipeline::LocationPipeline;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: geoverdict <image>...");
        std::process::exit(2);
    }

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        visual = config.visual_url.is_some(),
        geocoder = !config.geocoder_url.is_empty(),
        store = ?config.store_path,
        images = paths.len(),
        "Geoverdict starting"
    );

    let pipeline = LocationPipeline::from_config(&config)?;

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        images.push(bytes);
    }

    let results = pipeline.resolve_batch(&images).await;

    let mut failures = 0usize;
    for (path, result) in paths.iter().zip(results) {
        let line = match result {
            Ok(verdict) => json!({
                "path": path.display().to_string(),
                "verdict": verdict,
            }),
            Err(e) => {
                failures += 1;
                json!({
                    "path": path.display().to_string(),
                    "error": e.to_string(),
                })
            }
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    let stats = pipeline.stats();
    tracing::info!(
        requests = stats.requests,
        resolutions = stats.resolutions,
        cache_hits = stats.cache_hits,
        coalesced = stats.coalesced,
        failures = stats.failures,
        settled_entries = stats.settled_entries,
        avg_resolution_ms = stats.avg_resolution_ms,
        "Geoverdict finished"
    );

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
