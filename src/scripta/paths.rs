use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScriptaPaths {
    pub scripta_home: PathBuf,
    pub staging_dir: PathBuf,
    pub storage_dir: PathBuf,
    pub catalog_file: PathBuf,
    pub logs_dir: PathBuf,
    pub quarantine_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ScriptaPaths {
    /// Lays out every path under a single root, with no env overrides.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            staging_dir: root.join("dropit"),
            storage_dir: root.join("storage"),
            catalog_file: root.join("database.json"),
            logs_dir: root.join("logs"),
            quarantine_dir: root.join("quarantine"),
            state_dir: root.join("state"),
            scripta_home: root,
        }
    }

    pub fn watch_stop_file(&self) -> PathBuf {
        self.state_dir.join("watch.stop")
    }
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<ScriptaPaths> {
    let scripta_home = match env::var("SCRIPTA_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join("scripta"),
    };
    let defaults = ScriptaPaths::under(&scripta_home);

    Ok(ScriptaPaths {
        staging_dir: env_or_default_path("SCRIPTA_STAGING_DIR", defaults.staging_dir),
        storage_dir: env_or_default_path("SCRIPTA_STORAGE_DIR", defaults.storage_dir),
        catalog_file: env_or_default_path("SCRIPTA_CATALOG_FILE", defaults.catalog_file),
        logs_dir: env_or_default_path("SCRIPTA_LOGS_DIR", defaults.logs_dir),
        quarantine_dir: env_or_default_path("SCRIPTA_QUARANTINE_DIR", defaults.quarantine_dir),
        state_dir: defaults.state_dir,
        scripta_home,
    })
}
