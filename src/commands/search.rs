use anyhow::Result;

use crate::commands::CommandReport;
use crate::scripta::catalog::CatalogStore;
use crate::scripta::paths::resolve_paths;
use crate::scripta::query;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub query: String,
}

pub fn run(opts: &SearchOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let records = CatalogStore::new(&paths.catalog_file).load()?;
    let mut report = CommandReport::new("search");

    let hits = query::search(&records, &opts.query);
    if hits.is_empty() {
        report.detail("no matches");
        return Ok(report);
    }
    for record in hits {
        report.detail(format!(
            "{}. {} - {}",
            record.index, record.path, record.description
        ));
    }
    Ok(report)
}
