use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::scripta::audit;
use crate::scripta::catalog::{CatalogStore, find_by_index};
use crate::scripta::config::load_config;
use crate::scripta::paths::resolve_paths;
use crate::scripta::query::{self, FieldUpdates};
use crate::scripta::titler::{read_document_text, titler_from_config};

#[derive(Debug, Clone)]
pub struct SuggestOptions {
    pub index: u64,
    pub apply: bool,
}

pub fn run(opts: &SuggestOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let store = CatalogStore::new(&paths.catalog_file);
    let records = store.load()?;
    let mut report = CommandReport::new("suggest");

    let Some(record) = find_by_index(&records, opts.index) else {
        report.issue(format!("NOT_FOUND: no document with index {}", opts.index));
        return Ok(report);
    };

    let titler = titler_from_config(&cfg.titler)?;
    report.detail(format!("provider={}", titler.label()));
    let title = read_document_text(Path::new(&record.path), cfg.titler.max_input_chars)
        .and_then(|text| titler.suggest(&text));
    let title = match title {
        Ok(title) => title,
        Err(err) => {
            report.issue(format!("{}: {err}", err.code()));
            return Ok(report);
        }
    };
    report.detail(format!("suggestion={title}"));

    if opts.apply {
        let updated = query::edit(
            &store,
            opts.index,
            &FieldUpdates {
                description: Some(title.clone()),
                ..FieldUpdates::default()
            },
        )?;
        report.detail(format!("applied index={}", updated.index));
        audit::append_event(
            &paths,
            "suggest",
            "applied",
            &format!("index={} provider={}", updated.index, titler.label()),
        )?;
    }
    Ok(report)
}
