use anyhow::{Context, Result};
use std::fs;
use std::time::Duration;

use crate::commands::{CommandReport, MetadataOptions, metadata_source, report_pass};
use crate::scripta::audit;
use crate::scripta::config::load_config;
use crate::scripta::ingest::{Ingestor, PassOutcome};
use crate::scripta::paths::resolve_paths;
use crate::scripta::warn::{self, WarnEvent};
use crate::scripta::watcher::{WatchOptions, run_continuous};

/// Running counts over every pass of one `watch` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchTotals {
    pub cataloged: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl WatchTotals {
    pub fn add(&mut self, pass: &PassOutcome) {
        self.cataloged += pass.cataloged();
        self.duplicates += pass.duplicates();
        self.failed += pass.failed();
    }
}

/// Per-file lines for one pass, prefixed with the pass number.
fn pass_lines(n: u64, pass: &PassOutcome) -> Vec<String> {
    let mut rendered = CommandReport::new("watch");
    report_pass(&mut rendered, pass);
    rendered
        .details
        .iter()
        .chain(rendered.issues.iter())
        .map(|line| format!("scripta watch: pass={n} {line}"))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct WatchCommandOptions {
    pub metadata: MetadataOptions,
    pub interval_secs: Option<u64>,
    pub max_passes: Option<u64>,
}

pub fn run(opts: &WatchCommandOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?;
    let mut report = CommandReport::new("watch");

    let interval_secs = opts
        .interval_secs
        .unwrap_or(cfg.watcher.poll_interval_secs)
        .max(1);
    report.detail(format!("staging_dir={}", paths.staging_dir.display()));
    report.detail(format!("poll_interval_secs={interval_secs}"));

    let stop_file = paths.watch_stop_file();
    if stop_file.exists() {
        fs::remove_file(&stop_file)
            .with_context(|| format!("failed to clear stale {}", stop_file.display()))?;
    }

    let ingestor = Ingestor::new(&paths, cfg.ingest.clone());
    let mut source = metadata_source(&opts.metadata);
    let mut totals = WatchTotals::default();

    let result = run_continuous(
        &ingestor,
        source.as_mut(),
        WatchOptions {
            poll_interval: Duration::from_secs(interval_secs),
            max_passes: opts.max_passes,
        },
        &mut || stop_file.exists(),
        &mut |n: u64, pass: &PassOutcome| {
            for line in pass_lines(n, pass) {
                eprintln!("{line}");
            }
            let status = if pass.failed() == 0 { "ok" } else { "degraded" };
            if let Err(err) =
                audit::append_event(&paths, "watch", status, &format!("pass={n} {}", pass.summary()))
            {
                warn::emit(WarnEvent {
                    code: "AUDIT_WRITE_FAILED",
                    stage: "watch",
                    file: &paths.logs_dir.display().to_string(),
                    reason: "audit-append-failed",
                    err: &format!("{err:#}"),
                });
            }
            totals.add(pass);
        },
    );

    if stop_file.exists() {
        let _ = fs::remove_file(&stop_file);
    }


    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            audit::append_event(&paths, "watch", "aborted", &format!("error={err}"))?;
            return Err(err.into());
        }
    };
    report.detail(format!("passes={}", summary.passes));
    report.detail(format!("cancelled={}", summary.cancelled));
    report.detail(format!(
        "cataloged={} duplicates={}",
        totals.cataloged, totals.duplicates
    ));
    if totals.failed > 0 {
        report.issue(format!(
            "failed={} (see SCRIPTA_WARN lines; failed files stay in staging)",
            totals.failed
        ));
    }
    Ok(report)
}
