use anyhow::{Context, Result};
use std::fs;

use crate::commands::CommandReport;
use crate::scripta::paths::resolve_paths;
use crate::scripta::util::now_epoch_secs;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("stop");

    let stop_file = paths.watch_stop_file();
    if let Some(parent) = stop_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&stop_file, format!("{}\n", now_epoch_secs()?))
        .with_context(|| format!("failed to write {}", stop_file.display()))?;

    report.detail(format!("stop_file={}", stop_file.display()));
    report.detail("watch stops after its current pass completes");
    Ok(report)
}
