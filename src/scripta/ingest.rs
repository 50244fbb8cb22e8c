use crate::error::{IoContext, Result, ScriptaError};
use crate::scripta::catalog::{CatalogStore, DocumentRecord, find_by_digest};
use crate::scripta::config::{DuplicatePolicy, PersistMode, ScriptaIngestConfig};
use crate::scripta::hasher::digest_file;
use crate::scripta::metadata::{Candidate, DocumentMetadata, FixedMetadata, MetadataSource};
use crate::scripta::paths::ScriptaPaths;
use crate::scripta::placer::{ArchivePlacer, file_format, move_file};
use crate::scripta::warn::{self, WarnEvent};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Cataloged(DocumentRecord),
    Duplicate {
        existing_index: u64,
        quarantined: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Cataloged(DocumentRecord),
    Duplicate {
        existing_index: u64,
        quarantined: Option<PathBuf>,
    },
    Failed {
        code: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    pub files: Vec<FileOutcome>,
    pub catalog_len: usize,
}

impl PassOutcome {
    pub fn cataloged(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Cataloged(_)))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Duplicate { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "discovered={} cataloged={} duplicates={} failed={} catalog_len={}",
            self.files.len(),
            self.cataloged(),
            self.duplicates(),
            self.failed(),
            self.catalog_len
        )
    }
}

/// Runs staged files through hash, duplicate check, placement and cataloging.
///
/// Single-writer: nothing guards the catalog against a second process.
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: CatalogStore,
    placer: ArchivePlacer,
    staging_dir: PathBuf,
    quarantine_dir: PathBuf,
    settings: ScriptaIngestConfig,
}

impl Ingestor {
    pub fn new(paths: &ScriptaPaths, settings: ScriptaIngestConfig) -> Self {
        Self {
            store: CatalogStore::new(&paths.catalog_file),
            placer: ArchivePlacer::new(&paths.storage_dir),
            staging_dir: paths.staging_dir.clone(),
            quarantine_dir: paths.quarantine_dir.clone(),
            settings,
        }
    }

    /// Regular files directly under the staging directory, in path order.
    /// Symlinks to regular files count; dangling links do not.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.staging_dir)
            .io_context(|| format!("failed to create {}", self.staging_dir.display()))?;
        let entries = fs::read_dir(&self.staging_dir)
            .io_context(|| format!("failed to read {}", self.staging_dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry =
                entry.io_context(|| format!("failed to read {}", self.staging_dir.display()))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Files one document with the given metadata and persists the catalog.
    pub fn ingest(&self, file: &Path, metadata: DocumentMetadata) -> Result<IngestOutcome> {
        let mut records = self.store.load()?;
        let outcome = self.process_candidate(&mut records, file, &mut FixedMetadata(metadata))?;
        if let IngestOutcome::Cataloged(record) = &outcome {
            if self.settings.persist_mode == PersistMode::Batch {
                self.persist_or_restore(&mut records, Path::new(&record.path), file)?;
            }
        }
        Ok(outcome)
    }

    /// One pass over the staging directory. Per-file failures are reported in
    /// the outcome; only catalog load/save failures abort the pass.
    pub fn run_pass(&self, source: &mut dyn MetadataSource) -> Result<PassOutcome> {
        let mut records = self.store.load()?;
        let candidates = self.discover()?;

        let mut files = Vec::with_capacity(candidates.len());
        let mut placed = Vec::new();
        for file in candidates {
            let status = match self.process_candidate(&mut records, &file, source) {
                Ok(IngestOutcome::Cataloged(record)) => {
                    placed.push((PathBuf::from(&record.path), file.clone()));
                    FileStatus::Cataloged(record)
                }
                Ok(IngestOutcome::Duplicate {
                    existing_index,
                    quarantined,
                }) => FileStatus::Duplicate {
                    existing_index,
                    quarantined,
                },
                Err(err) => {
                    let reason = match err {
                        ScriptaError::RestoreFailed { .. } => "file-left-in-archive",
                        _ => "file-left-in-staging",
                    };
                    warn::emit(WarnEvent {
                        code: err.code(),
                        stage: "ingest",
                        file: &file.display().to_string(),
                        reason,
                        err: &err.to_string(),
                    });
                    FileStatus::Failed {
                        code: err.code(),
                        message: err.to_string(),
                    }
                }
            };
            files.push(FileOutcome { file, status });
        }

        if self.settings.persist_mode == PersistMode::Batch && !placed.is_empty() {
            if let Err(err) = self.store.save(&records) {
                return Err(restore_placed(&placed, err));
            }
        }

        Ok(PassOutcome {
            files,
            catalog_len: records.len(),
        })
    }

    fn process_candidate(
        &self,
        records: &mut Vec<DocumentRecord>,
        file: &Path,
        source: &mut dyn MetadataSource,
    ) -> Result<IngestOutcome> {
        let digest = digest_file(file)?;

        if let Some(existing) = find_by_digest(records, &digest) {
            let existing_index = existing.index;
            let quarantined = self.dispose_duplicate(file, &digest)?;
            return Ok(IngestOutcome::Duplicate {
                existing_index,
                quarantined,
            });
        }

        let metadata = source.describe(&Candidate {
            path: file,
            digest: &digest,
        })?;
        let stored = self.placer.place(file, &metadata.date, &digest)?;

        let record = DocumentRecord {
            index: records.len() as u64 + 1,
            description: metadata.description,
            date: metadata.date,
            author: metadata.author,
            recipient: metadata.recipient,
            refnum: metadata.refnum,
            digest,
            format: file_format(file),
            path: stored.display().to_string(),
        };
        records.push(record.clone());

        if self.settings.persist_mode == PersistMode::PerFile {
            self.persist_or_restore(records, &stored, file)?;
        }
        Ok(IngestOutcome::Cataloged(record))
    }

    /// Saves the catalog; on failure drops the newest record and moves its file back.
    fn persist_or_restore(
        &self,
        records: &mut Vec<DocumentRecord>,
        stored: &Path,
        original: &Path,
    ) -> Result<()> {
        if let Err(err) = self.store.save(records) {
            records.pop();
            return Err(restore_placed(
                &[(stored.to_path_buf(), original.to_path_buf())],
                err,
            ));
        }
        Ok(())
    }

    fn dispose_duplicate(&self, file: &Path, digest: &str) -> Result<Option<PathBuf>> {
        match self.settings.duplicate_policy {
            DuplicatePolicy::Delete => {
                fs::remove_file(file)
                    .io_context(|| format!("failed to delete duplicate {}", file.display()))?;
                Ok(None)
            }
            DuplicatePolicy::Quarantine => {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let target = self.quarantine_dir.join(format!("{digest}-{name}"));
                if target.exists() {
                    fs::remove_file(file)
                        .io_context(|| format!("failed to delete duplicate {}", file.display()))?;
                } else {
                    move_file(file, &target)?;
                }
                Ok(Some(target))
            }
        }
    }
}

/// Moves placed files back to staging after a failed catalog save. Files that
/// cannot be moved back are warned about and named in the returned error.
fn restore_placed(placed: &[(PathBuf, PathBuf)], cause: ScriptaError) -> ScriptaError {
    let mut stranded = Vec::new();
    for (stored, original) in placed {
        if let Err(err) = move_file(stored, original) {
            warn::emit(WarnEvent {
                code: err.code(),
                stage: "restore",
                file: &stored.display().to_string(),
                reason: "restore-failed",
                err: &err.to_string(),
            });
            stranded.push(stored.clone());
        }
    }
    if stranded.is_empty() {
        cause
    } else {
        ScriptaError::RestoreFailed {
            cause: Box::new(cause),
            stranded,
        }
    }
}
