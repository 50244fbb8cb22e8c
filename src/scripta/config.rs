use crate::scripta::paths::ScriptaPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// When the catalog is written during an ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistMode {
    /// Save after every filed document; a crash loses at most the file in flight.
    PerFile,
    /// Save once at the end of the pass.
    Batch,
}

impl PersistMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "per-file" | "per_file" | "perfile" => Some(Self::PerFile),
            "batch" => Some(Self::Batch),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PerFile => "per-file",
            Self::Batch => "batch",
        }
    }
}

/// What happens to a staged file whose digest is already cataloged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    Delete,
    Quarantine,
}

impl DuplicatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "delete" => Some(Self::Delete),
            "quarantine" => Some(Self::Quarantine),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Quarantine => "quarantine",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptaWatcherConfig {
    pub poll_interval_secs: u64,
}

impl Default for ScriptaWatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptaIngestConfig {
    pub persist_mode: PersistMode,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for ScriptaIngestConfig {
    fn default() -> Self {
        Self {
            persist_mode: PersistMode::PerFile,
            duplicate_policy: DuplicatePolicy::Delete,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptaTitlerConfig {
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_max_input_chars() -> usize {
    8_000
}

impl Default for ScriptaTitlerConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: String::new(),
            base_url: None,
            max_input_chars: default_max_input_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptaConfig {
    pub watcher: ScriptaWatcherConfig,
    pub ingest: ScriptaIngestConfig,
    pub titler: ScriptaTitlerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialScriptaConfig {
    watcher: Option<ScriptaWatcherConfig>,
    ingest: Option<ScriptaIngestConfig>,
    titler: Option<ScriptaTitlerConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_parsed<T>(var: &str, parse: fn(&str) -> Option<T>, fallback: T) -> Result<T> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => {
            parse(&v).ok_or_else(|| anyhow!("invalid value for {var}: `{}`", v.trim()))
        }
        _ => Ok(fallback),
    }
}

const TITLER_PROVIDERS: [&str; 4] = ["local", "openai", "anthropic", "gemini"];

fn validate(cfg: &ScriptaConfig) -> Result<()> {
    if cfg.watcher.poll_interval_secs == 0 {
        return Err(anyhow!(
            "invalid watcher poll interval: must be >= 1 second"
        ));
    }
    if !TITLER_PROVIDERS.contains(&cfg.titler.provider.as_str()) {
        return Err(anyhow!(
            "invalid titler provider `{}`: use one of {}",
            cfg.titler.provider,
            TITLER_PROVIDERS.join(", ")
        ));
    }
    if cfg.titler.max_input_chars == 0 {
        return Err(anyhow!("invalid titler max_input_chars: must be >= 1"));
    }
    Ok(())
}

pub fn config_path(paths: &ScriptaPaths) -> PathBuf {
    if let Ok(custom) = env::var("SCRIPTA_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    paths.scripta_home.join("scripta.toml")
}

fn merge_file_config(base: &mut ScriptaConfig, raw: &str, origin: &str) -> Result<()> {
    let parsed: PartialScriptaConfig = toml::from_str(raw)
        .map_err(|err| anyhow!("failed to parse scripta config {origin}: {err}"))?;
    if let Some(watcher) = parsed.watcher {
        base.watcher = watcher;
    }
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    if let Some(titler) = parsed.titler {
        base.titler = titler;
    }
    Ok(())
}

pub fn load_config(paths: &ScriptaPaths) -> Result<ScriptaConfig> {
    let mut cfg = ScriptaConfig::default();
    let path = config_path(paths);
    if path.exists() {
        let raw = fs::read_to_string(&path)?;
        merge_file_config(&mut cfg, &raw, &path.display().to_string())?;
    }

    cfg.watcher.poll_interval_secs =
        env_or_u64("SCRIPTA_POLL_INTERVAL_SECS", cfg.watcher.poll_interval_secs);
    cfg.ingest.persist_mode = env_parsed(
        "SCRIPTA_PERSIST_MODE",
        PersistMode::parse,
        cfg.ingest.persist_mode,
    )?;
    cfg.ingest.duplicate_policy = env_parsed(
        "SCRIPTA_DUPLICATE_POLICY",
        DuplicatePolicy::parse,
        cfg.ingest.duplicate_policy,
    )?;
    cfg.titler.provider = env_or_string("SCRIPTA_TITLER_PROVIDER", &cfg.titler.provider);
    cfg.titler.model = env_or_string("SCRIPTA_TITLER_MODEL", &cfg.titler.model);
    if let Ok(v) = env::var("SCRIPTA_TITLER_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.titler.base_url = Some(v.trim().to_string());
        }
    }

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sections_replace_defaults() {
        let mut cfg = ScriptaConfig::default();
        let raw = r#"
[watcher]
poll_interval_secs = 30

[ingest]
persist_mode = "batch"
duplicate_policy = "quarantine"
"#;
        merge_file_config(&mut cfg, raw, "test").expect("merge");
        assert_eq!(cfg.watcher.poll_interval_secs, 30);
        assert_eq!(cfg.ingest.persist_mode, PersistMode::Batch);
        assert_eq!(cfg.ingest.duplicate_policy, DuplicatePolicy::Quarantine);
        assert_eq!(cfg.titler.provider, "local");
    }

    #[test]
    fn titler_section_defaults_missing_fields() {
        let mut cfg = ScriptaConfig::default();
        merge_file_config(&mut cfg, "[titler]\nprovider = \"anthropic\"\n", "test")
            .expect("merge");
        assert_eq!(cfg.titler.provider, "anthropic");
        assert_eq!(cfg.titler.max_input_chars, 8_000);
        assert!(cfg.titler.base_url.is_none());
    }

    #[test]
    fn partial_sections_keep_defaults_for_missing_keys() {
        let mut cfg = ScriptaConfig::default();
        let raw = "[ingest]\npersist_mode = \"batch\"\n\n[watcher]\n\n[titler]\nmodel = \"m\"\n";
        merge_file_config(&mut cfg, raw, "test").expect("merge");
        assert_eq!(cfg.ingest.persist_mode, PersistMode::Batch);
        assert_eq!(cfg.ingest.duplicate_policy, DuplicatePolicy::Delete);
        assert_eq!(cfg.watcher.poll_interval_secs, 5);
        assert_eq!(cfg.titler.provider, "local");
        assert_eq!(cfg.titler.model, "m");
    }

    #[test]
    fn validate_rejects_zero_interval_and_unknown_provider() {
        let mut cfg = ScriptaConfig::default();
        cfg.watcher.poll_interval_secs = 0;
        assert!(validate(&cfg).is_err());

        let mut cfg = ScriptaConfig::default();
        cfg.titler.provider = "oracle".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn mode_parsers_accept_labels() {
        for mode in [PersistMode::PerFile, PersistMode::Batch] {
            assert_eq!(PersistMode::parse(mode.label()), Some(mode));
        }
        for policy in [DuplicatePolicy::Delete, DuplicatePolicy::Quarantine] {
            assert_eq!(DuplicatePolicy::parse(policy.label()), Some(policy));
        }
        assert_eq!(PersistMode::parse("sometimes"), None);
    }
}
