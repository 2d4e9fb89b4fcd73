use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use roster_core::config::{Config, StatusStoreConfig, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config for inconsistent criteria and settings
    Validate,

    /// Show the execution, status store, and watch settings
    Show,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Show => show(root, json),
    }
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        return print_json(&serde_json::json!({
            "organization": config.organization.name,
            "execution": config.execution,
            "status_store": config.status_store,
            "watch": config.watch,
        }));
    }

    println!("Organization:  {}", config.organization.name);
    println!(
        "Execution:     {} attempt(s), {} ms initial backoff",
        config.execution.max_attempts, config.execution.backoff_ms
    );
    match &config.status_store {
        StatusStoreConfig::Ledger => println!("Status store:  ledger (.roster/members.yaml)"),
        StatusStoreConfig::Http {
            base_url,
            token_env,
            timeout_secs,
        } => {
            println!("Status store:  http {base_url} (timeout {timeout_secs}s)");
            if let Some(var) = token_env {
                println!("Token from:    ${var}");
            }
        }
    }
    println!("Watch:         every {}s", config.watch.interval_secs);
    Ok(())
}
