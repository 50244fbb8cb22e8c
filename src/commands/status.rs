use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::scripta::catalog::CatalogStore;
use crate::scripta::config::{config_path, load_config};
use crate::scripta::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/scripta_env_allowlist.rs"));

/// `SCRIPTA_*` names set in the environment that no code path reads.
pub fn unknown_env_keys<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unknown: Vec<String> = keys
        .into_iter()
        .filter(|k| k.starts_with("SCRIPTA_"))
        .filter(|k| !GENERATED_SCRIPTA_ENV_ALLOWLIST.contains(&k.as_str()))
        .collect();
    unknown.sort();
    unknown
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("scripta_home={}", paths.scripta_home.display()));
    report.detail(format!("staging_dir={}", paths.staging_dir.display()));
    report.detail(format!("storage_dir={}", paths.storage_dir.display()));
    report.detail(format!("catalog_file={}", paths.catalog_file.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("quarantine_dir={}", paths.quarantine_dir.display()));
    report.detail(format!("config_path={}", config_path(&paths).display()));

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!(
                "poll_interval_secs={}",
                cfg.watcher.poll_interval_secs
            ));
            report.detail(format!("persist_mode={}", cfg.ingest.persist_mode.label()));
            report.detail(format!(
                "duplicate_policy={}",
                cfg.ingest.duplicate_policy.label()
            ));
            report.detail(format!("titler_provider={}", cfg.titler.provider));
        }
        Err(err) => report.issue(format!("invalid config: {err:#}")),
    }

    let store = CatalogStore::new(&paths.catalog_file);
    match store.load() {
        Ok(records) => report.detail(format!(
            "catalog_records={} ({})",
            records.len(),
            store.path().display()
        )),
        Err(err) => report.issue(format!("{}: {err}", err.code())),
    }

    if !paths.staging_dir.exists() {
        report.detail("staging dir not created yet (first scan creates it)");
    }
    if paths.watch_stop_file().exists() {
        report.detail("watch stop requested and not yet consumed");
    }

    for key in unknown_env_keys(env::vars().map(|(k, _)| k)) {
        report.issue(format!("unknown environment variable {key}"));
    }

    Ok(report)
}
