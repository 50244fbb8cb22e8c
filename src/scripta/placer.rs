use crate::error::{IoContext, Result, ScriptaError};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Year, month and day exactly as written in a validated `YYYY-MM-DD` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDate {
    pub year: String,
    pub month: String,
    pub day: String,
}

/// Accepts only zero-padded `YYYY-MM-DD` naming a real calendar day.
pub fn parse_declared_date(raw: &str) -> Result<DeclaredDate> {
    let invalid = || ScriptaError::InvalidDate {
        date: raw.to_string(),
    };
    let bytes = raw.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(invalid());
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;

    Ok(DeclaredDate {
        year: raw[0..4].to_string(),
        month: raw[5..7].to_string(),
        day: raw[8..10].to_string(),
    })
}

/// Lowercase extension without the dot; empty when the name has none.
pub fn file_format(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Copies `from` to `to` and removes `from`. If the source cannot be removed the
/// copy is deleted again, so a failed move never leaves a file at `to`.
fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .io_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    if let Err(err) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(ScriptaError::io(
            format!("failed to remove {}", from.display()),
            err,
        ));
    }
    Ok(())
}

pub(crate) fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .io_context(|| format!("failed to create {}", parent.display()))?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) if rename_err.kind() == ErrorKind::CrossesDevices => copy_then_remove(from, to),
        Err(rename_err) => Err(ScriptaError::io(
            format!("failed to move {} to {}", from.display(), to.display()),
            rename_err,
        )),
    }
}

#[derive(Debug, Clone)]
pub struct ArchivePlacer {
    storage_root: PathBuf,
}

impl ArchivePlacer {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// `storage_root/YYYY/MM/DD/<digest><.ext>` with the source extension kept verbatim.
    pub fn target_path(&self, source: &Path, declared_date: &str, digest: &str) -> Result<PathBuf> {
        let date = parse_declared_date(declared_date)?;
        let file_name = match source.extension() {
            Some(ext) => format!("{digest}.{}", ext.to_string_lossy()),
            None => digest.to_string(),
        };
        Ok(self
            .storage_root
            .join(&date.year)
            .join(&date.month)
            .join(&date.day)
            .join(file_name))
    }

    /// Moves `source` into the archive tree. Never overwrites an existing file.
    pub fn place(&self, source: &Path, declared_date: &str, digest: &str) -> Result<PathBuf> {
        let target = self.target_path(source, declared_date, digest)?;
        if target.exists() {
            return Err(ScriptaError::PlacementConflict { path: target });
        }
        move_file(source, &target)?;
        Ok(target)
    }
}
