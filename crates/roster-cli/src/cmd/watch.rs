use crate::cmd::scan::{print_report, scan_once};
use crate::output::print_json;
use crate::schedule::{CancelHandle, Schedule};
use anyhow::Context;
use roster_core::config::Config;
use std::path::Path;
use std::time::Duration;

pub fn run(root: &Path, interval: Option<u64>, runs: Option<u64>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let secs = interval.unwrap_or(config.watch.interval_secs);
    if secs == 0 {
        anyhow::bail!("interval must be at least 1 second");
    }
    if runs == Some(0) {
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        tracing::info!(interval_secs = secs, "watching for compliance changes");

        let cancel = CancelHandle::new();
        let stopper = cancel.clone();
        let schedule = Schedule::start(Duration::from_secs(secs), &cancel, move |run| {
            match scan_once(&root_buf) {
                Ok((report, _)) if json => {
                    if let Err(e) = print_json(&report) {
                        tracing::error!(error = %e, "failed to print scan report");
                    }
                }
                Ok((report, _)) => print_report(&report),
                // A failed scan leaves the previous queue in place; try again next tick.
                Err(e) => {
                    let msg = format!("{e:#}");
                    tracing::error!(run, error = %msg, "scan failed");
                }
            }
            if runs.is_some_and(|max| run >= max) {
                stopper.cancel();
            }
        });

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping watcher");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }

        let completed = schedule.join().await?;
        tracing::info!(runs = completed, cancelled = cancel.is_cancelled(), "watcher stopped");
        Ok(())
    })
}
