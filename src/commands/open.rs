use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::scripta::catalog::{CatalogStore, find_by_index};
use crate::scripta::paths::resolve_paths;
use crate::scripta::viewer::{open_document, resolve_opener};

#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub index: u64,
}

pub fn run(opts: &OpenOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let records = CatalogStore::new(&paths.catalog_file).load()?;
    let mut report = CommandReport::new("open");

    let Some(record) = find_by_index(&records, opts.index) else {
        report.issue(format!("NOT_FOUND: no document with index {}", opts.index));
        return Ok(report);
    };
    let path = Path::new(&record.path);
    if !path.is_file() {
        report.issue(format!("stored file missing: {}", record.path));
        return Ok(report);
    }

    let opener = resolve_opener()?;
    open_document(&opener, path)?;
    report.detail(format!("opened index={} path={}", record.index, record.path));
    report.detail(format!("opener={}", opener.program.display()));
    Ok(report)
}
