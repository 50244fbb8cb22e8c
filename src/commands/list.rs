use anyhow::Result;

use crate::commands::CommandReport;
use crate::scripta::catalog::CatalogStore;
use crate::scripta::paths::resolve_paths;
use crate::scripta::query;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let store = CatalogStore::new(&paths.catalog_file);
    let records = store.load()?;
    let mut report = CommandReport::new("list");

    if records.is_empty() {
        report.detail("catalog is empty");
        return Ok(report);
    }
    for record in query::list(&records) {
        report.detail(format!(
            "{}. {} - {} - {}",
            record.index, record.date, record.refnum, record.description
        ));
    }
    Ok(report)
}
