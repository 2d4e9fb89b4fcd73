use crate::cmd::queue::print_queue;
use crate::output::print_json;
use anyhow::Context;
use roster_core::{
    config::Config,
    queue::ActionQueue,
    repository::FileRepository,
    scan::{run_scan, ScanReport},
};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let (report, queue) = scan_once(root)?;

    if json {
        let entries = queue.sorted();
        return print_json(&serde_json::json!({
            "report": report,
            "queue": entries,
        }));
    }

    print_report(&report);
    if !queue.is_empty() {
        println!();
        print_queue(&queue);
    }
    Ok(())
}

/// Evaluate every member, replace the persisted queue, and return both.
pub fn scan_once(root: &Path) -> anyhow::Result<(ScanReport, ActionQueue)> {
    let config = Config::load(root).context("failed to load config")?;
    if !config.scan_errors().is_empty() {
        anyhow::bail!("config has errors; run `roster config validate` for details");
    }

    let repo = FileRepository::new(root);
    let mut queue = ActionQueue::load(root).context("failed to load queue")?;
    let report = run_scan(&repo, &mut queue, chrono::Utc::now()).context("scan failed")?;
    queue.save(root).context("failed to write queue.yaml")?;
    Ok((report, queue))
}

pub fn print_report(report: &ScanReport) {
    println!(
        "Scanned {} member(s) against {} criteria at {}: {} proposed action(s)",
        report.members_scanned,
        report.criteria_enabled,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.proposals
    );
    if report.replaced > 0 {
        println!("Replaced {} action(s) from the previous scan.", report.replaced);
    }
}
