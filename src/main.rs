use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use appdef::model::config::ToolConfig;
use appdef::{ConditionStatus, DESCRIPTOR_FILE, Descriptor, LocalFetcher};

const USAGE: &str = "usage: appdef <descriptor-uri> [app-dir]";

fn main() -> Result<()> {
    let config = ToolConfig::load()?;

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "appdef")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "appdef.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(config.logging.filter.as_str())
        .init();

    tracing::info!("appdef starting");

    let mut args = std::env::args().skip(1);
    let Some(source) = args.next() else {
        bail!(USAGE);
    };
    let app_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => config.apps_root().join(app_name(&source)),
    };

    if let Err(e) = run(&source, &app_dir) {
        tracing::error!("appdef failed: {e:?}");
        return Err(e);
    }

    Ok(())
}

fn run(source: &str, app_dir: &Path) -> Result<()> {
    let fetcher = LocalFetcher::new();
    let mut descriptor = Descriptor::load(source, app_dir, &fetcher)
        .with_context(|| format!("loading {source}"))?;

    let synced = descriptor.sync_cache(&fetcher);
    match &synced {
        Ok(()) => descriptor.status.set_condition(
            "Synced",
            ConditionStatus::True,
            Some("ReposFetched"),
            None,
        ),
        Err(e) => descriptor.status.set_condition(
            "Synced",
            ConditionStatus::False,
            Some("FetchFailed"),
            Some(e.to_string().as_str()),
        ),
    }

    // Persist whatever was synced, even on failure, so a rerun can pick up from it.
    descriptor.write_to_file(app_dir.join(DESCRIPTOR_FILE))?;
    synced.context("syncing repository cache")?;

    for (name, cache) in &descriptor.status.repos_cache {
        println!("{name}\t{}", cache.local_path.display());
    }

    Ok(())
}

fn app_name(source: &str) -> String {
    let trimmed = source.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = last
        .strip_suffix(".toml")
        .filter(|stem| !stem.is_empty())
        .unwrap_or(last);

    if stem.is_empty() {
        "app".to_string()
    } else {
        stem.to_string()
    }
}
