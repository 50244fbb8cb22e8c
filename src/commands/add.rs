use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::scripta::audit;
use crate::scripta::config::load_config;
use crate::scripta::ingest::{IngestOutcome, Ingestor};
use crate::scripta::metadata::DocumentMetadata;
use crate::scripta::paths::resolve_paths;
use crate::scripta::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct AddOptions {
    pub file: PathBuf,
    pub metadata: DocumentMetadata,
}

pub fn run(opts: &AddOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("add");
    let file = opts.file.display().to_string();

    if !opts.file.is_file() {
        report.issue(format!("not a regular file: {file}"));
        return Ok(report);
    }

    let ingestor = Ingestor::new(&paths, cfg.ingest.clone());
    match ingestor.ingest(&opts.file, opts.metadata.clone()) {
        Ok(IngestOutcome::Cataloged(record)) => {
            report.detail(format!(
                "cataloged file={file} index={} path={}",
                record.index, record.path
            ));
            report.detail(format!("digest={}", record.digest));
            audit::append_event(
                &paths,
                "ingest",
                "ok",
                &format!("file={file} index={}", record.index),
            )?;
        }
        Ok(IngestOutcome::Duplicate {
            existing_index,
            quarantined,
        }) => {
            report.detail(format!(
                "duplicate file={file} existing_index={existing_index}"
            ));
            if let Some(target) = quarantined {
                report.detail(format!("quarantined={}", target.display()));
            }
        }
        Err(err) => {
            warn::emit(WarnEvent {
                code: err.code(),
                stage: "ingest",
                file: &file,
                reason: "file-left-in-place",
                err: &err.to_string(),
            });
            report.issue(format!("failed file={file} code={} error={err}", err.code()));
        }
    }

    Ok(report)
}
