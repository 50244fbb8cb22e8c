use anyhow::Result;

use crate::commands::CommandReport;
use crate::error::ScriptaError;
use crate::scripta::audit;
use crate::scripta::catalog::CatalogStore;
use crate::scripta::paths::resolve_paths;
use crate::scripta::query::{self, FieldUpdates};

#[derive(Debug, Clone)]
pub struct EditOptions {
    pub index: u64,
    pub updates: FieldUpdates,
}

pub fn run(opts: &EditOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let store = CatalogStore::new(&paths.catalog_file);
    let mut report = CommandReport::new("edit");

    if opts.updates.is_empty() {
        report.detail("no non-empty fields given; record unchanged");
    }

    match query::edit(&store, opts.index, &opts.updates) {
        Ok(record) => {
            report.detail(format!(
                "{}. {} - {} - {}",
                record.index, record.date, record.refnum, record.description
            ));
            report.detail(format!("author={}", record.author));
            report.detail(format!("recipient={}", record.recipient));
            report.detail(format!("path={}", record.path));
            audit::append_event(&paths, "edit", "ok", &format!("index={}", record.index))?;
        }
        Err(err @ (ScriptaError::NotFound { .. } | ScriptaError::InvalidDate { .. })) => {
            report.issue(format!("{}: {err}", err.code()));
        }
        Err(err) => return Err(err.into()),
    }
    Ok(report)
}
