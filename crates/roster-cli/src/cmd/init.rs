use anyhow::Context;
use roster_core::{config::Config, io, paths, queue::ActionQueue, snapshot::MemberRoster};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let org_name = name.map(str::to_string).unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "organization".to_string())
    });

    println!("Initializing roster in: {}", root.display());

    let dir = paths::roster_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&org_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    if paths::members_path(root).exists() {
        println!("  exists:  {}", paths::MEMBERS_FILE);
    } else {
        MemberRoster::default()
            .save(root)
            .context("failed to write members.yaml")?;
        println!("  created: {}", paths::MEMBERS_FILE);
    }

    if paths::queue_path(root).exists() {
        println!("  exists:  {}", paths::QUEUE_FILE);
    } else {
        ActionQueue::new()
            .save(root)
            .context("failed to write queue.yaml")?;
        println!("  created: {}", paths::QUEUE_FILE);
    }

    println!("\nroster initialized for '{org_name}'. Next: add members to {} and run `roster scan`.", paths::MEMBERS_FILE);
    Ok(())
}
