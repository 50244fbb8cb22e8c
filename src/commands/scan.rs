use anyhow::Result;

use crate::commands::{CommandReport, MetadataOptions, metadata_source, report_pass};
use crate::scripta::audit;
use crate::scripta::config::load_config;
use crate::scripta::ingest::Ingestor;
use crate::scripta::paths::resolve_paths;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub metadata: MetadataOptions,
}

pub fn run(opts: &ScanOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("scan");

    report.detail(format!("staging_dir={}", paths.staging_dir.display()));
    report.detail(format!("persist_mode={}", cfg.ingest.persist_mode.label()));
    report.detail(format!(
        "duplicate_policy={}",
        cfg.ingest.duplicate_policy.label()
    ));

    let ingestor = Ingestor::new(&paths, cfg.ingest.clone());
    let mut source = metadata_source(&opts.metadata);
    let pass = match ingestor.run_pass(source.as_mut()) {
        Ok(pass) => pass,
        Err(err) => {
            audit::append_event(&paths, "ingest", "aborted", &format!("error={err}"))?;
            return Err(err.into());
        }
    };

    report_pass(&mut report, &pass);
    let status = if pass.failed() == 0 { "ok" } else { "degraded" };
    audit::append_event(&paths, "ingest", status, &pass.summary())?;
    Ok(report)
}
