use crate::error::{IoContext, Result, ScriptaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub index: u64,
    pub description: String,
    pub date: String,
    pub author: String,
    pub recipient: String,
    pub refnum: String,
    pub digest: String,
    pub format: String,
    pub path: String,
}

impl DocumentRecord {
    /// Every field rendered as text, in declaration order. Search matches against these.
    pub fn field_strings(&self) -> [String; 9] {
        [
            self.index.to_string(),
            self.description.clone(),
            self.date.clone(),
            self.author.clone(),
            self.recipient.clone(),
            self.refnum.clone(),
            self.digest.clone(),
            self.format.clone(),
            self.path.clone(),
        ]
    }
}

/// The JSON file holding the ordered record list. Holds no records itself.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<DocumentRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ScriptaError::io(
                    format!("failed to read {}", self.path.display()),
                    err,
                ));
            }
        };
        let records: Vec<DocumentRecord> =
            serde_json::from_str(&raw).map_err(|err| ScriptaError::CorruptCatalog {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        check_invariants(&records).map_err(|reason| ScriptaError::CorruptCatalog {
            path: self.path.clone(),
            reason,
        })?;
        Ok(records)
    }

    /// Replaces the catalog file with `records` via a sibling temp file and rename.
    pub fn save(&self, records: &[DocumentRecord]) -> Result<()> {
        check_invariants(records).map_err(|reason| ScriptaError::CorruptCatalog {
            path: self.path.clone(),
            reason: format!("refusing to save: {reason}"),
        })?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .io_context(|| format!("failed to create {}", parent.display()))?;

        let data = serde_json::to_string_pretty(records).map_err(|err| {
            ScriptaError::io(
                format!("failed to serialize {}", self.path.display()),
                std::io::Error::new(ErrorKind::InvalidData, err),
            )
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)
            .io_context(|| format!("failed to create temp file in {}", parent.display()))?;
        temp.write_all(format!("{data}\n").as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .io_context(|| format!("failed to write temp catalog for {}", self.path.display()))?;
        temp.persist(&self.path)
            .map_err(|err| err.error)
            .io_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

fn check_invariants(records: &[DocumentRecord]) -> std::result::Result<(), String> {
    let mut digests = BTreeSet::new();
    let mut indexes = BTreeSet::new();
    for record in records {
        if record.index == 0 {
            return Err("record index 0 is not allowed".to_string());
        }
        if !indexes.insert(record.index) {
            return Err(format!("duplicate index {}", record.index));
        }
        if !digests.insert(record.digest.as_str()) {
            return Err(format!("duplicate digest {}", record.digest));
        }
    }
    Ok(())
}

pub fn find_by_digest<'a>(records: &'a [DocumentRecord], digest: &str) -> Option<&'a DocumentRecord> {
    records.iter().find(|r| r.digest == digest)
}

pub fn find_by_index(records: &[DocumentRecord], index: u64) -> Option<&DocumentRecord> {
    records.iter().find(|r| r.index == index)
}

#[cfg(test)]
pub(crate) fn sample_record(index: u64, digest: &str) -> DocumentRecord {
    DocumentRecord {
        index,
        description: format!("document {index}"),
        date: "2024-01-05".to_string(),
        author: "Registry".to_string(),
        recipient: "Court".to_string(),
        refnum: format!("REF/{index}"),
        digest: digest.to_string(),
        format: "pdf".to_string(),
        path: format!("storage/2024/01/05/{digest}.pdf"),
    }
}
