use crate::output::{print_fields, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use roster_core::{
    config::Config,
    criteria::{ComplianceCriterion, CriterionUpdate},
    types::{MemberAction, Severity},
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum CriteriaSubcommand {
    /// List all criteria
    List,

    /// Show one criterion
    Show { id: String },

    /// Edit a criterion (rejected without saving if the result is inconsistent)
    Set {
        id: String,
        /// Enable the criterion
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        /// Disable the criterion
        #[arg(long)]
        disable: bool,
        #[arg(long)]
        threshold: Option<f64>,
        /// Action proposed on violation: warning, probation, suspension, inactive
        #[arg(long, value_parser = parse_action)]
        action: Option<MemberAction>,
        /// Comma-separated list of actions the operator may choose from
        #[arg(long, value_delimiter = ',', value_parser = parse_action)]
        allow: Option<Vec<MemberAction>>,
        /// high, medium, or low
        #[arg(long, value_parser = parse_severity)]
        severity: Option<Severity>,
        #[arg(long)]
        label: Option<String>,
    },
}

fn parse_action(s: &str) -> Result<MemberAction, String> {
    s.parse().map_err(|e: roster_core::RosterError| e.to_string())
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse().map_err(|e: roster_core::RosterError| e.to_string())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: CriteriaSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CriteriaSubcommand::List => list(root, json),
        CriteriaSubcommand::Show { id } => show(root, &id, json),
        CriteriaSubcommand::Set {
            id,
            enable,
            disable,
            threshold,
            action,
            allow,
            severity,
            label,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let update = CriterionUpdate {
                enabled,
                threshold,
                severity,
                allowed_actions: allow,
                selected_action: action,
                label,
            };
            set(root, &id, &update, json)
        }
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        return print_json(&config.criteria);
    }
    if config.criteria.is_empty() {
        println!("No criteria configured.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = config
        .criteria
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.comparison_type.to_string(),
                c.threshold.to_string(),
                if c.enabled { "yes" } else { "no" }.to_string(),
                c.severity.to_string(),
                c.selected_action.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "TYPE", "THRESHOLD", "ENABLED", "SEVERITY", "ACTION"],
        &rows,
    );
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let criterion = config.criterion(id)?;
    if json {
        print_json(criterion)
    } else {
        print_criterion(criterion);
        Ok(())
    }
}

fn set(root: &Path, id: &str, update: &CriterionUpdate, json: bool) -> anyhow::Result<()> {
    if update.is_empty() {
        anyhow::bail!("nothing to change: pass at least one of --enable, --disable, --threshold, --action, --allow, --severity, --label");
    }

    let mut config = Config::load(root).context("failed to load config")?;
    config
        .update_criterion(id, update)
        .with_context(|| format!("criterion '{id}' was not changed"))?;
    config.save(root).context("failed to write config.yaml")?;

    let criterion = config.criterion(id)?;
    if json {
        print_json(criterion)
    } else {
        println!("Updated criterion '{id}'.");
        print_criterion(criterion);
        Ok(())
    }
}

fn print_criterion(c: &ComplianceCriterion) {
    let allowed: Vec<&str> = c.allowed_actions.iter().map(|a| a.as_str()).collect();
    let mut fields = vec![
        ("Id", c.id.clone()),
        ("Label", c.display_label()),
        ("Type", c.comparison_type.to_string()),
        ("Threshold", c.threshold.to_string()),
        ("Enabled", c.enabled.to_string()),
        ("Severity", c.severity.to_string()),
        ("Allowed", allowed.join(", ")),
        ("Action", c.selected_action.to_string()),
    ];
    if let Some(ref desc) = c.description {
        fields.push(("Description", desc.clone()));
    }
    print_fields(&fields);
}
