pub mod add;
pub mod backup;
pub mod edit;
pub mod list;
pub mod open;
pub mod scan;
pub mod search;
pub mod stats;
pub mod status;
pub mod stop;
pub mod suggest;
pub mod watch;

use crate::scripta::ingest::{FileStatus, PassOutcome};
use crate::scripta::metadata::{DocumentMetadata, FixedMetadata, MetadataSource, PromptMetadata};
use crate::scripta::viewer::resolve_opener;
use crate::scripta::warn::{self, WarnEvent};
use serde::Serialize;
use std::io;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Where per-document metadata comes from for `scan` and `watch`.
#[derive(Debug, Clone, Default)]
pub struct MetadataOptions {
    pub interactive: bool,
    pub fields: DocumentMetadata,
}

pub fn metadata_source(opts: &MetadataOptions) -> Box<dyn MetadataSource> {
    if opts.interactive {
        let prompt = PromptMetadata::new(io::stdin().lock(), io::stderr());
        match resolve_opener() {
            Ok(opener) => Box::new(prompt.with_viewer(opener)),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "VIEWER_UNAVAILABLE",
                    stage: "describe",
                    file: "",
                    reason: "documents-not-shown",
                    err: &format!("{err:#}"),
                });
                Box::new(prompt)
            }
        }
    } else {
        Box::new(FixedMetadata(opts.fields.clone()))
    }
}

pub fn report_pass(report: &mut CommandReport, pass: &PassOutcome) {
    for outcome in &pass.files {
        let file = outcome.file.display();
        match &outcome.status {
            FileStatus::Cataloged(record) => report.detail(format!(
                "cataloged file={file} index={} path={}",
                record.index, record.path
            )),
            FileStatus::Duplicate {
                existing_index,
                quarantined: Some(target),
            } => report.detail(format!(
                "duplicate file={file} existing_index={existing_index} quarantined={}",
                target.display()
            )),
            FileStatus::Duplicate {
                existing_index,
                quarantined: None,
            } => report.detail(format!(
                "duplicate file={file} existing_index={existing_index} deleted=true"
            )),
            FileStatus::Failed { code, message } => {
                report.issue(format!("failed file={file} code={code} error={message}"))
            }
        }
    }
    report.detail(pass.summary());
}
