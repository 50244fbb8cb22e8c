use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::scripta::audit;
use crate::scripta::backup::create_backup;
use crate::scripta::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    pub output: Option<PathBuf>,
}

pub fn run(opts: &BackupOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("backup");

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| paths.scripta_home.join("backup.zip"));
    let outcome = create_backup(&paths, &output)?;

    report.detail(format!("output={}", outcome.output_path.display()));
    report.detail(format!("archived_files={}", outcome.archived_files));
    report.detail(format!("archived_bytes={}", outcome.archived_bytes));
    report.detail(format!("catalog_included={}", outcome.catalog_included));
    audit::append_event(
        &paths,
        "backup",
        "ok",
        &format!(
            "output={} files={}",
            outcome.output_path.display(),
            outcome.archived_files
        ),
    )?;
    Ok(report)
}
