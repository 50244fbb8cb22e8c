use crate::error::{IoContext, Result};
use crate::scripta::viewer::{Opener, open_document};
use crate::scripta::warn::{self, WarnEvent};
use std::io::{BufRead, Write};
use std::path::Path;

/// Caller-supplied fields for one document. Only `date` is ever validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub description: String,
    pub date: String,
    pub author: String,
    pub recipient: String,
    pub refnum: String,
}

/// A staged file that passed the duplicate check and now needs metadata.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub path: &'a Path,
    pub digest: &'a str,
}

pub trait MetadataSource {
    fn describe(&mut self, candidate: &Candidate<'_>) -> Result<DocumentMetadata>;
}

/// Hands every candidate the same metadata. Used by batch callers and CLI flags.
#[derive(Debug, Clone)]
pub struct FixedMetadata(pub DocumentMetadata);

impl MetadataSource for FixedMetadata {
    fn describe(&mut self, _candidate: &Candidate<'_>) -> Result<DocumentMetadata> {
        Ok(self.0.clone())
    }
}

/// Asks for each field on `output` and reads one line per answer from `input`.
/// With a viewer attached, each document is opened before its questions.
pub struct PromptMetadata<R, W> {
    input: R,
    output: W,
    viewer: Option<Opener>,
}

impl<R: BufRead, W: Write> PromptMetadata<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, opener: Opener) -> Self {
        self.viewer = Some(opener);
        self
    }

    fn show(&self, path: &Path) {
        let Some(opener) = &self.viewer else {
            return;
        };
        if let Err(err) = open_document(opener, path) {
            warn::emit(WarnEvent {
                code: "VIEWER_FAILED",
                stage: "describe",
                file: &path.display().to_string(),
                reason: "document-not-shown",
                err: &format!("{err:#}"),
            });
        }
    }

    fn ask(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{label}: ")
            .and_then(|_| self.output.flush())
            .io_context(|| "failed to write prompt")?;
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .io_context(|| "failed to read answer")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> MetadataSource for PromptMetadata<R, W> {
    fn describe(&mut self, candidate: &Candidate<'_>) -> Result<DocumentMetadata> {
        self.show(candidate.path);
        let name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(self.output, "\n== {name} ({})", candidate.digest)
            .io_context(|| "failed to write prompt")?;

        Ok(DocumentMetadata {
            description: self.ask("Description")?,
            date: self.ask("Date (YYYY-MM-DD)")?,
            author: self.ask("Author")?,
            recipient: self.ask("Recipient")?,
            refnum: self.ask("Reference number")?,
        })
    }
}
