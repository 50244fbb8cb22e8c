use crate::scripta::paths::ScriptaPaths;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub output_path: PathBuf,
    pub archived_files: usize,
    pub archived_bytes: u64,
    pub catalog_included: bool,
}

fn collect_files(root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            out.push(path);
        } else if path.is_dir() {
            collect_files(&path, out)?;
        }
    }
    Ok(())
}

/// Zip entry name for `path` relative to `root`, always `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn add_file<W: io::Write + io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    path: &Path,
) -> Result<u64> {
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .large_file(true);
    zip.start_file(name, options)
        .with_context(|| format!("failed to start zip entry {name}"))?;
    let mut source =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let copied = io::copy(&mut source, zip)
        .with_context(|| format!("failed to add {} to backup", path.display()))?;
    Ok(copied)
}

/// Writes the archive tree plus the catalog file into one zip at `output`.
pub fn create_backup(paths: &ScriptaPaths, output: &Path) -> Result<BackupOutcome> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let mut files = Vec::new();
    if paths.storage_dir.exists() {
        collect_files(&paths.storage_dir, &mut files)?;
    }
    files.sort();

    let temp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    let mut zip = ZipWriter::new(temp);

    let mut archived_bytes = 0u64;
    for path in &files {
        let name = entry_name(&paths.storage_dir, path)?;
        archived_bytes += add_file(&mut zip, &name, path)?;
    }

    let catalog_included = paths.catalog_file.is_file();
    if catalog_included {
        let name = paths
            .catalog_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "database.json".to_string());
        add_file(&mut zip, &name, &paths.catalog_file)?;
    }

    let temp = zip.finish().context("failed to finalize backup zip")?;
    temp.persist(output)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(BackupOutcome {
        output_path: output.to_path_buf(),
        archived_files: files.len(),
        archived_bytes,
        catalog_included,
    })
}
