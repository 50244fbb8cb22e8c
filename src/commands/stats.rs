use anyhow::Result;

use crate::commands::CommandReport;
use crate::scripta::catalog::CatalogStore;
use crate::scripta::paths::resolve_paths;
use crate::scripta::stats;

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let records = CatalogStore::new(&paths.catalog_file).load()?;
    let mut report = CommandReport::new("stats");

    let collected = stats::collect(&records);
    report.detail(format!("documents={}", collected.records));
    report.detail(format!(
        "total_size_mb={:.2}",
        collected.total_bytes as f64 / BYTES_PER_MB
    ));
    for (record, len) in &collected.largest {
        report.detail(format!(
            "largest index={} size_kb={:.2} path={}",
            record.index,
            *len as f64 / BYTES_PER_KB,
            record.path
        ));
    }
    for record in &collected.missing {
        report.issue(format!(
            "missing stored file index={} path={}",
            record.index, record.path
        ));
    }
    Ok(report)
}
