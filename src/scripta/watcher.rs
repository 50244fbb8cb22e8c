use crate::error::Result;
use crate::scripta::ingest::{Ingestor, PassOutcome};
use crate::scripta::metadata::MetadataSource;
use std::thread;
use std::time::{Duration, Instant};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub poll_interval: Duration,
    pub max_passes: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub passes: u64,
    pub cancelled: bool,
}

/// Sleeps up to `total`, waking early once `should_stop` reports true.
fn sleep_unless_stopped(total: Duration, should_stop: &mut dyn FnMut() -> bool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if should_stop() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(STOP_POLL_INTERVAL.min(deadline - now));
    }
}

/// Repeats ingestion passes until `should_stop` is observed or `max_passes` is
/// reached. The stop check only runs between passes. Errors that abort a pass
/// (corrupt catalog, unreadable staging dir) end the loop.
pub fn run_continuous(
    ingestor: &Ingestor,
    source: &mut dyn MetadataSource,
    opts: WatchOptions,
    should_stop: &mut dyn FnMut() -> bool,
    on_pass: &mut dyn FnMut(u64, &PassOutcome),
) -> Result<WatchSummary> {
    let mut summary = WatchSummary::default();
    loop {
        if should_stop() {
            summary.cancelled = true;
            return Ok(summary);
        }

        let outcome = ingestor.run_pass(source)?;
        summary.passes += 1;
        on_pass(summary.passes, &outcome);

        if opts.max_passes.is_some_and(|max| summary.passes >= max) {
            return Ok(summary);
        }
        if sleep_unless_stopped(opts.poll_interval, should_stop) {
            summary.cancelled = true;
            return Ok(summary);
        }
    }
}
