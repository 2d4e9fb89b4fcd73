use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use roster_core::{config::Config, queue::ActionQueue, status_store};
use std::path::Path;

#[derive(Subcommand)]
pub enum QueueSubcommand {
    /// List pending actions in review order
    List,

    /// Apply a proposed action through the status store
    Execute {
        member_id: String,
        criterion_id: String,
    },

    /// Discard a proposed action without applying it
    Dismiss {
        member_id: String,
        criterion_id: String,
    },

    /// Discard every pending action
    Clear,
}

pub fn run(root: &Path, subcmd: QueueSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        QueueSubcommand::List => list(root, json),
        QueueSubcommand::Execute {
            member_id,
            criterion_id,
        } => execute(root, &member_id, &criterion_id, json),
        QueueSubcommand::Dismiss {
            member_id,
            criterion_id,
        } => dismiss(root, &member_id, &criterion_id, json),
        QueueSubcommand::Clear => clear(root, json),
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let queue = ActionQueue::load(root).context("failed to load queue")?;
    if json {
        return print_json(&queue.sorted());
    }
    if queue.is_empty() {
        println!("No pending actions.");
        return Ok(());
    }
    print_queue(&queue);
    Ok(())
}

pub fn print_queue(queue: &ActionQueue) {
    let rows: Vec<Vec<String>> = queue
        .sorted()
        .into_iter()
        .map(|e| {
            let a = &e.action;
            vec![
                a.severity.to_string(),
                a.member_id.clone(),
                a.member_name.clone(),
                a.criterion_id.clone(),
                format!("{} → {}", a.current_status, a.proposed_action),
                a.reason.clone(),
                match e.last_error {
                    Some(ref err) => format!("FAILED x{}: {err}", e.attempts),
                    None => String::new(),
                },
            ]
        })
        .collect();
    print_table(
        &["SEVERITY", "MEMBER", "NAME", "CRITERION", "ACTION", "REASON", "RETRY"],
        &rows,
    );
}

fn execute(root: &Path, member_id: &str, criterion_id: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let mut queue = ActionQueue::load(root).context("failed to load queue")?;
    let action = queue.find(member_id, criterion_id)?.action.clone();
    let store = status_store::from_config(root, &config.status_store)?;

    let outcome = queue.execute(&action, store.as_ref(), &config.execution);
    // Persist either way: success removes the entry, failure records the error.
    queue.save(root).context("failed to write queue.yaml")?;
    outcome?;

    if json {
        print_json(&serde_json::json!({ "executed": action }))
    } else {
        println!(
            "Executed {} for {} ({}): status is now {}",
            action.proposed_action,
            action.member_name,
            action.member_id,
            action.proposed_action.target_status()
        );
        Ok(())
    }
}

fn dismiss(root: &Path, member_id: &str, criterion_id: &str, json: bool) -> anyhow::Result<()> {
    let mut queue = ActionQueue::load(root).context("failed to load queue")?;
    let action = queue.find(member_id, criterion_id)?.action.clone();
    queue.dismiss(&action)?;
    queue.save(root).context("failed to write queue.yaml")?;

    if json {
        print_json(&serde_json::json!({ "dismissed": action }))
    } else {
        println!(
            "Dismissed {} for {} on {}",
            action.proposed_action, action.member_name, action.criterion_id
        );
        Ok(())
    }
}

fn clear(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut queue = ActionQueue::load(root).context("failed to load queue")?;
    let count = queue.len();
    queue.clear();
    queue.save(root).context("failed to write queue.yaml")?;

    if json {
        print_json(&serde_json::json!({ "cleared": count }))
    } else {
        println!("Cleared {count} pending action(s).");
        Ok(())
    }
}
